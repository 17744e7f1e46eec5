//! Progress-callback trait for per-image fetch events.
//!
//! Inject an [`Arc<dyn FetchProgressCallback>`] via
//! [`crate::config::FetchConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the batch.
//!
//! # Example
//!
//! ```rust
//! use wallsort::{FetchConfig, FetchProgressCallback, Orientation};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     horizontal: AtomicUsize,
//! }
//!
//! impl FetchProgressCallback for CountingCallback {
//!     fn on_unit_complete(&self, url: &str, orientation: Orientation, _ratio: f64) {
//!         if orientation == Orientation::Horizontal {
//!             self.horizontal.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("{url} -> {orientation}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { horizontal: AtomicUsize::new(0) });
//!
//! let config = FetchConfig::builder()
//!     .progress_callback(cb as Arc<dyn FetchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FetchError;
use crate::output::Orientation;
use std::sync::Arc;

/// Called by the orchestrator as each unit of work progresses.
///
/// Units run concurrently, so `on_unit_*` may be called from several tasks
/// at once and in any order. All methods default to no-ops.
pub trait FetchProgressCallback: Send + Sync {
    /// Called once before any unit is dispatched.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a unit begins (before the file is created).
    fn on_unit_start(&self, url: &str) {
        let _ = url;
    }

    /// Called when a unit has been routed to its destination.
    fn on_unit_complete(&self, url: &str, orientation: Orientation, ratio: f64) {
        let _ = (url, orientation, ratio);
    }

    /// Called when a unit fails at any stage.
    fn on_unit_error(&self, url: &str, error: &FetchError) {
        let _ = (url, error);
    }

    /// Called once after every unit has reported.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FetchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FetchConfig`].
pub type ProgressCallback = Arc<dyn FetchProgressCallback>;
