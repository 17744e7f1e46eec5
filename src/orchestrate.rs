//! Batch entry points: list, filter, fan out, aggregate.
//!
//! [`run`] is the whole pipeline. [`fetch_batch`] is the orchestrator on
//! its own, for callers that already have their URLs. Both wait for every
//! unit to report before deciding the aggregate verdict.

use crate::config::FetchConfig;
use crate::error::WallsortError;
use crate::listing::{ListingRequest, SubmissionSource};
use crate::output::{BatchReport, BatchSummary, FetchOutcome};
use crate::pipeline::fetch::ImageFetcher;
use crate::pipeline::filter::ExtensionFilter;
use crate::stream::fetch_stream;
use futures::StreamExt;
use reqwest::Client;
use std::time::Instant;
use tracing::{info, warn};

/// List submissions and keep the eligible URLs.
///
/// # Errors
/// Listing failures are fatal and returned unchanged; no partial list is
/// ever processed.
pub async fn list_eligible(
    source: &dyn SubmissionSource,
    request: &ListingRequest,
    config: &FetchConfig,
) -> Result<Vec<String>, WallsortError> {
    let filter = ExtensionFilter::new(&config.allowed_extensions)?;
    let submissions = source.submissions(request).await?;
    let candidates = submissions.len();

    let eligible = filter.filter(submissions.into_iter().map(|s| s.url));
    info!(
        "{} of {} submissions from r/{} are eligible images",
        eligible.len(),
        candidates,
        request.subreddit
    );
    Ok(eligible)
}

/// Fetch, classify and route every URL, returning all outcomes.
///
/// Never short-circuits: every unit runs to completion regardless of its
/// siblings. Destination directories must already exist (see
/// [`crate::pipeline::route::PlacementRouter::prepare`]).
pub async fn fetch_batch(fetcher: &ImageFetcher, urls: Vec<String>, config: &FetchConfig) -> BatchReport {
    let start = Instant::now();
    let total = urls.len();
    info!(
        "Fetching {} images (concurrency limit {})",
        total,
        config.concurrency_limit(total)
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let outcomes: Vec<FetchOutcome> = fetch_stream(fetcher.clone(), urls, config).collect().await;

    let report = BatchReport {
        outcomes,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    let succeeded = report.succeeded();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }
    if succeeded == total {
        info!("Batch complete: {}/{} images in {}ms", succeeded, total, report.duration_ms);
    } else {
        warn!(
            "Batch complete with failures: {}/{} images in {}ms",
            succeeded, total, report.duration_ms
        );
    }
    report
}

/// The whole pipeline: list → filter → prepare destinations → fetch → aggregate.
///
/// `client` is shared read-only by every unit of work.
///
/// # Errors
/// - listing / configuration errors before any download starts
/// - [`WallsortError::DestinationSetup`] if a destination cannot be created
/// - [`WallsortError::BatchFailed`] if any unit failed (first failure in
///   completion order)
pub async fn run(
    source: &dyn SubmissionSource,
    request: &ListingRequest,
    config: &FetchConfig,
    client: Client,
) -> Result<BatchSummary, WallsortError> {
    run_report(source, request, config, client).await?.into_result()
}

/// Like [`run`], but returns every per-URL outcome instead of the verdict.
///
/// Only listing and destination setup errors are returned as `Err`; unit
/// failures stay inside the report.
pub async fn run_report(
    source: &dyn SubmissionSource,
    request: &ListingRequest,
    config: &FetchConfig,
    client: Client,
) -> Result<BatchReport, WallsortError> {
    let eligible = list_eligible(source, request, config).await?;

    let fetcher = ImageFetcher::new(client, config);
    fetcher.router().prepare().await?;

    Ok(fetch_batch(&fetcher, eligible, config).await)
}
