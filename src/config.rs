//! Configuration for the fetch-classify-place pipeline.
//!
//! All pipeline behaviour is controlled through [`FetchConfig`], built via
//! its [`FetchConfigBuilder`]. The struct is assembled once at startup and
//! passed by reference into each component; nothing in the core reads
//! global state.

use crate::error::WallsortError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default `User-Agent` for both the listing API and image downloads.
pub const DEFAULT_USER_AGENT: &str = concat!("wallsort/", env!("CARGO_PKG_VERSION"));

/// Configuration for one fetch run.
///
/// # Example
/// ```rust
/// use wallsort::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .allowed_extensions(["jpg", "png"])
///     .max_concurrency(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_concurrency, 8);
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Bare file extensions (`jpg`, `png`) a URL path must end with. Default: `jpg`, `png`.
    ///
    /// Matching is case-sensitive; list `JPG` separately if it should pass.
    pub allowed_extensions: Vec<String>,

    /// Upper bound on units of work in flight. Default: 0 (unbounded).
    pub max_concurrency: usize,

    /// Directory downloads land in before routing. Default: `.`.
    pub work_dir: PathBuf,

    /// Destination for images with `width / height > 1.0`. Default: `hori`.
    pub horizontal_dir: PathBuf,

    /// Destination for every other image. Default: `vert`.
    pub vertical_dir: PathBuf,

    /// Remove the working file when a unit fails. Default: false.
    ///
    /// When off, failed downloads stay in `work_dir` for inspection.
    pub cleanup_on_failure: bool,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
            max_concurrency: 0,
            work_dir: PathBuf::from("."),
            horizontal_dir: PathBuf::from("hori"),
            vertical_dir: PathBuf::from("vert"),
            cleanup_on_failure: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_concurrency", &self.max_concurrency)
            .field("work_dir", &self.work_dir)
            .field("horizontal_dir", &self.horizontal_dir)
            .field("vertical_dir", &self.vertical_dir)
            .field("cleanup_on_failure", &self.cleanup_on_failure)
            .field("user_agent", &self.user_agent)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn FetchProgressCallback>"),
            )
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Effective in-flight limit for a batch of `units` URLs.
    ///
    /// Zero means unbounded, i.e. every unit is dispatched at once.
    pub fn concurrency_limit(&self, units: usize) -> usize {
        match self.max_concurrency {
            0 => units.max(1),
            n => n,
        }
    }

    /// Place every relative directory under `root`.
    ///
    /// Absolute paths are left untouched.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for dir in [
            &mut self.work_dir,
            &mut self.horizontal_dir,
            &mut self.vertical_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn horizontal_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.horizontal_dir = dir.into();
        self
    }

    pub fn vertical_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.vertical_dir = dir.into();
        self
    }

    pub fn cleanup_on_failure(mut self, v: bool) -> Self {
        self.config.cleanup_on_failure = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetchConfig, WallsortError> {
        let c = &self.config;
        if let Some(bad) = c
            .allowed_extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.') || e.contains('/'))
        {
            return Err(WallsortError::InvalidConfig(format!(
                "allowed extensions must be bare suffixes like \"jpg\", got {bad:?}"
            )));
        }
        if c.horizontal_dir == c.vertical_dir {
            return Err(WallsortError::InvalidConfig(format!(
                "horizontal and vertical destinations must differ (both {:?})",
                c.horizontal_dir
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(WallsortError::InvalidConfig(
                "user agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
