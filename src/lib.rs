//! # wallsort
//!
//! Fetch image submissions from a subreddit and sort them by orientation.
//!
//! Every eligible image is downloaded concurrently, its pixel size is read
//! from the file header (no full decode), and it is moved into a
//! *horizontal* directory when `width / height > 1.0` or a *vertical*
//! directory otherwise.
//!
//! ## Pipeline Overview
//!
//! ```text
//! r/<subreddit>
//!  │
//!  ├─ 1. List     OAuth password grant + /r/<sub>/<sort>?limit=N
//!  ├─ 2. Filter   keep URLs whose path ends in an allowed extension
//!  ├─ 3. Fetch    per URL, concurrently: name → create → HEAD → GET
//!  ├─ 4. Extract  JPEG/PNG header → width / height (spawn_blocking)
//!  ├─ 5. Route    rename into hori/ or vert/
//!  └─ 6. Verdict  success only if every unit succeeded
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wallsort::{run, RedditClient, RedditEndpoints, Settings};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(Path::new("default.toml"))?;
//!     let config = settings.fetch_config()?;
//!     let client = wallsort::pipeline::fetch::build_client(&config)?;
//!
//!     let session = RedditClient::authenticate(
//!         client.clone(),
//!         &settings.credentials(),
//!         RedditEndpoints::default(),
//!     )
//!     .await?;
//!
//!     let summary = run(&session, &settings.listing_request(), &config, client).await?;
//!     println!("{} horizontal, {} vertical", summary.horizontal, summary.vertical);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `wallsort` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod listing;
pub mod orchestrate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod settings;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{FetchError, WallsortError};
pub use listing::{
    ListingRequest, ListingSort, RedditClient, RedditCredentials, RedditEndpoints, RedditSession,
    StaticSource, Submission, SubmissionSource,
};
pub use orchestrate::{fetch_batch, list_eligible, run, run_report};
pub use output::{BatchReport, BatchSummary, FetchOutcome, FetchedImage, ImageMetadata, Orientation};
pub use pipeline::fetch::ImageFetcher;
pub use pipeline::filter::ExtensionFilter;
pub use pipeline::route::PlacementRouter;
pub use progress::{FetchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use settings::Settings;
pub use stream::fetch_stream;
