//! Error types for the wallsort library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`WallsortError`] — **Fatal**: the run cannot proceed at all
//!   (authentication rejected, listing unavailable, bad configuration), or
//!   the batch finished with at least one failed image. Returned as
//!   `Err(WallsortError)` from the top-level functions.
//!
//! * [`FetchError`] — **Per image**: one unit of work failed (bad name,
//!   HTTP error, corrupt header) while every other unit keeps running.
//!   Stored inside [`crate::output::FetchOutcome`] and only promoted to a
//!   fatal [`WallsortError::BatchFailed`] once the whole batch has settled.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wallsort library.
#[derive(Debug, Error)]
pub enum WallsortError {
    // ── Listing collaborator ──────────────────────────────────────────────
    /// The OAuth token exchange failed or was rejected.
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// The submission listing could not be fetched or parsed.
    #[error("Failed to list submissions for r/{subreddit}: {reason}")]
    Listing { subreddit: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configuration file does not exist.
    #[error("Config file not found: '{path}'")]
    ConfigNotFound { path: PathBuf },

    /// The configuration file exists but is not valid TOML for [`crate::settings::Settings`].
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Filesystem ────────────────────────────────────────────────────────
    /// A destination directory could not be created.
    #[error("Failed to create destination directory '{path}': {source}")]
    DestinationSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch ─────────────────────────────────────────────────────────────
    /// Every unit ran to completion but at least one failed.
    ///
    /// `first` is the first failure in completion order; which unit that is
    /// depends on scheduling and is not stable across runs.
    #[error("{failed}/{total} images failed; first error: {first}")]
    BatchFailed {
        failed: usize,
        total: usize,
        #[source]
        first: FetchError,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FetchError {
    /// No file name can be derived from the URL's final path segment.
    #[error("Cannot derive a file name from '{url}'")]
    Naming { url: String },

    /// Local file create, write or move failed.
    #[error("I/O error on '{path}': {detail}")]
    Io { path: PathBuf, detail: String },

    /// The HEAD probe or the body download failed.
    #[error("Network error fetching '{url}': {detail}")]
    Network { url: String, detail: String },

    /// The file is truncated, corrupt, or does not match its declared type.
    #[error("Could not decode '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// The declared content type is neither JPEG nor PNG.
    #[error("Unsupported content type '{content_type}'")]
    UnsupportedFormat { content_type: String },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            detail: err.to_string(),
        }
    }

    pub(crate) fn network(url: &str, detail: impl ToString) -> Self {
        FetchError::Network {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}
