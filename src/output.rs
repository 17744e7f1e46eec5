//! Result types produced by the fetch pipeline.

use crate::error::{FetchError, WallsortError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Landscape vs. portrait classification of an image.
///
/// Square images (ratio exactly 1.0) are [`Orientation::Vertical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Classify a `width / height` ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

/// Intrinsic size of a downloaded image plus the content type it was declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub content_type: String,
}

impl ImageMetadata {
    /// `width / height`.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_ratio(self.aspect_ratio())
    }
}

/// A successfully fetched and routed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedImage {
    /// Source URL.
    pub url: String,
    /// Final location inside the horizontal or vertical directory.
    pub path: PathBuf,
    pub metadata: ImageMetadata,
    pub orientation: Orientation,
    /// `Content-Length` reported by the HEAD probe, if any.
    pub declared_length: Option<u64>,
    /// Bytes actually written to disk.
    pub bytes_written: u64,
}

/// Terminal outcome of one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<FetchedImage, FetchError>,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts for a batch in which every unit succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub horizontal: usize,
    pub vertical: usize,
}

/// Every outcome of a batch, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FetchOutcome>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Collapse the report into the aggregate verdict.
    ///
    /// Succeeds only if every unit succeeded. Otherwise returns
    /// [`WallsortError::BatchFailed`] carrying the first failure in
    /// completion order.
    pub fn into_result(self) -> Result<BatchSummary, WallsortError> {
        let total = self.outcomes.len();
        let failed = self.failed();
        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        let mut first_error = None;

        for outcome in self.outcomes {
            match outcome.result {
                Ok(image) => match image.orientation {
                    Orientation::Horizontal => summary.horizontal += 1,
                    Orientation::Vertical => summary.vertical += 1,
                },
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => Ok(summary),
            Some(first) => Err(WallsortError::BatchFailed {
                failed,
                total,
                first,
            }),
        }
    }
}
