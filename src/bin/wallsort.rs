//! CLI binary for wallsort.
//!
//! A thin shim over the library crate that maps the config file and CLI
//! flags to `FetchConfig`, runs the pipeline, and prints one verdict line
//! to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wallsort::pipeline::fetch::build_client;
use wallsort::{
    list_eligible, run, run_report, BatchSummary, FetchConfig, FetchError, FetchProgressCallback,
    ListingRequest, ListingSort, Orientation, ProgressCallback, RedditClient, RedditEndpoints,
    Settings, StaticSource, SubmissionSource, WallsortError,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar; images complete out of order, so each finished
/// unit prints its own line above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl FetchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_unit_complete(&self, url: &str, orientation: Orientation, ratio: f64) {
        let arrow = match orientation {
            Orientation::Horizontal => "↔",
            Orientation::Vertical => "↕",
        };
        self.bar.println(format!(
            "  {} {} {}  {}",
            green("✓"),
            arrow,
            url,
            dim(&format!("{ratio:.3}"))
        ));
        self.bar.inc(1);
    }

    fn on_unit_error(&self, url: &str, error: &FetchError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = error.to_string();
        let msg = if msg.chars().count() > 80 {
            format!("{}\u{2026}", msg.chars().take(79).collect::<String>())
        } else {
            msg
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), url, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!("{} {}/{} images failed", red("✘"), failed, total);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Use ./default.toml
  wallsort

  # Another subreddit, newest 50 posts, at most 8 downloads at a time
  wallsort --subreddit wallpapers --sort new --limit 50 --max-concurrency 8

  # Skip Reddit and sort explicit URLs
  wallsort --url https://i.redd.it/abc.jpg --url https://i.imgur.com/def.png

  # Show which submissions would be downloaded
  wallsort --list-only

  # Machine-readable per-image report
  wallsort --json > report.json

CONFIG FILE (default.toml):
  [credentials]
  user = "earthbot"
  password = "..."

  [credentials.app]
  client-id = "..."
  client-secret = "..."

  [subreddit]
  name = "EarthPorn"
  sort = "hot"

  [subreddit.submissions]
  limit = 25
  allowed-extensions = ["jpg", "png"]

  [fetch]
  max_concurrency = 0     # 0 = unbounded

OUTPUT:
  hori/   images wider than they are tall
  vert/   everything else (square images included)
"#;

/// Download subreddit images and sort them into landscape and portrait folders.
#[derive(Parser, Debug)]
#[command(
    name = "wallsort",
    version,
    about = "Download subreddit images and sort them by orientation",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// TOML config file.
    #[arg(short, long, env = "WALLSORT_CONFIG", default_value = "default.toml")]
    config: PathBuf,

    /// Subreddit to list (overrides the config file).
    #[arg(long, env = "WALLSORT_SUBREDDIT")]
    subreddit: Option<String>,

    /// Listing sort order.
    #[arg(long, env = "WALLSORT_SORT", value_enum)]
    sort: Option<SortArg>,

    /// Maximum number of submissions to list.
    #[arg(short, long, env = "WALLSORT_LIMIT")]
    limit: Option<u32>,

    /// Maximum images downloading at once (0 = unbounded).
    #[arg(long, env = "WALLSORT_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Delete partial downloads of failed images.
    #[arg(long, env = "WALLSORT_CLEANUP_ON_FAILURE")]
    cleanup_on_failure: bool,

    /// Directory the working, horizontal and vertical folders live under.
    #[arg(long, env = "WALLSORT_ROOT")]
    root: Option<PathBuf>,

    /// Sort these URLs instead of listing Reddit (repeatable).
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Print eligible URLs and exit without downloading.
    #[arg(long)]
    list_only: bool,

    /// Print the per-image report as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "WALLSORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WALLSORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the verdict line.
    #[arg(short, long, env = "WALLSORT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl From<SortArg> for ListingSort {
    fn from(v: SortArg) -> Self {
        match v {
            SortArg::Hot => ListingSort::Hot,
            SortArg::New => ListingSort::New,
            SortArg::Top => ListingSort::Top,
            SortArg::Rising => ListingSort::Rising,
            SortArg::Controversial => ListingSort::Controversial,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level per-image logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.list_only && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match execute(&cli, show_progress).await {
        Ok(Some(summary)) => {
            if !cli.quiet && !cli.json {
                println!(
                    "Sorted {} images: {} horizontal, {} vertical",
                    summary.total, summary.horizontal, summary.vertical
                );
            }
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{e:#}");
            } else {
                println!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Run the requested mode. `Ok(None)` means `--list-only` finished.
async fn execute(cli: &Cli, show_progress: bool) -> Result<Option<BatchSummary>> {
    let settings = load_settings(cli)?;

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn FetchProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, settings.as_ref(), progress)?;
    let request = build_request(cli, settings.as_ref());
    let client = build_client(&config)?;

    let source: Box<dyn SubmissionSource> = if !cli.urls.is_empty() {
        Box::new(StaticSource::new(cli.urls.clone()))
    } else {
        let settings = settings
            .as_ref()
            .context("Reddit credentials require a config file")?;
        let session = RedditClient::authenticate(
            client.clone(),
            &settings.credentials(),
            RedditEndpoints::default(),
        )
        .await?;
        Box::new(session)
    };

    if cli.list_only {
        for url in list_eligible(source.as_ref(), &request, &config).await? {
            println!("{url}");
        }
        return Ok(None);
    }

    if cli.json {
        let report = run_report(source.as_ref(), &request, &config, client).await?;
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(Some(report.into_result()?));
    }

    let summary = run(source.as_ref(), &request, &config, client).await?;
    Ok(Some(summary))
}

/// Load the config file; it may be absent only when `--url` supplies the input.
fn load_settings(cli: &Cli) -> Result<Option<Settings>> {
    match Settings::load(&cli.config) {
        Ok(settings) => Ok(Some(settings)),
        Err(WallsortError::ConfigNotFound { .. }) if !cli.urls.is_empty() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", cli.config.display())),
    }
}

/// Map the config file plus CLI overrides to `FetchConfig`.
fn build_config(
    cli: &Cli,
    settings: Option<&Settings>,
    progress: Option<ProgressCallback>,
) -> Result<FetchConfig> {
    let mut config = match settings {
        Some(s) => s.fetch_config().context("Invalid configuration")?,
        None => FetchConfig::default(),
    };

    if let Some(n) = cli.max_concurrency {
        config.max_concurrency = n;
    }
    if cli.cleanup_on_failure {
        config.cleanup_on_failure = true;
    }
    config.progress_callback = progress;

    if let Some(ref root) = cli.root {
        config = config.rooted_at(root);
    }
    Ok(config)
}

fn build_request(cli: &Cli, settings: Option<&Settings>) -> ListingRequest {
    let mut request = match settings {
        Some(s) => s.listing_request(),
        None => ListingRequest {
            subreddit: "EarthPorn".to_string(),
            sort: ListingSort::default(),
            limit: cli.urls.len() as u32,
        },
    };
    if let Some(ref name) = cli.subreddit {
        request.subreddit = name.clone();
    }
    if let Some(sort) = cli.sort {
        request.sort = sort.into();
    }
    match cli.limit {
        Some(limit) => request.limit = limit,
        // Explicit URLs are never cut short by the config file's limit.
        None if !cli.urls.is_empty() => {
            request.limit = request.limit.max(cli.urls.len() as u32);
        }
        None => {}
    }
    request
}
