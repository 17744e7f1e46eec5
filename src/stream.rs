//! Streaming fan-out: emit each unit's outcome as soon as it finishes.
//!
//! [`crate::orchestrate::fetch_batch`] collects this stream; use
//! [`fetch_stream`] directly to react to images as they land. Outcomes
//! arrive in completion order, not input order.

use crate::config::FetchConfig;
use crate::output::FetchOutcome;
use crate::pipeline::fetch::ImageFetcher;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::warn;

/// A boxed stream of per-URL outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = FetchOutcome> + Send>>;

/// Dispatch one unit of work per URL, at most
/// [`FetchConfig::concurrency_limit`] at a time.
///
/// The stream yields exactly one outcome per input URL. Units are never
/// cancelled because a sibling failed; dropping the stream is the only way
/// to stop in-flight work.
pub fn fetch_stream(fetcher: ImageFetcher, urls: Vec<String>, config: &FetchConfig) -> OutcomeStream {
    let limit = config.concurrency_limit(urls.len());
    let progress = config.progress_callback.clone();

    let units = urls.into_iter().map(move |url| {
        let fetcher = fetcher.clone();
        let progress = progress.clone();
        async move {
            if let Some(ref cb) = progress {
                cb.on_unit_start(&url);
            }
            let result = fetcher.fetch(&url).await;
            match &result {
                Ok(image) => {
                    if let Some(ref cb) = progress {
                        cb.on_unit_complete(&url, image.orientation, image.metadata.aspect_ratio());
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    if let Some(ref cb) = progress {
                        cb.on_unit_error(&url, e);
                    }
                }
            }
            FetchOutcome { url, result }
        }
    });

    Box::pin(stream::iter(units).buffer_unordered(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Serves `/{name}.png` for each name, each GET delayed by `delay`.
    async fn serve_pngs(server: &MockServer, names: &[&str], delay: Duration) {
        for name in names {
            let route = format!("/{name}.png");
            Mock::given(method("HEAD"))
                .and(path(route.as_str()))
                .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
                .mount(server)
                .await;
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_bytes(png(40, 30))
                        .set_delay(delay),
                )
                .mount(server)
                .await;
        }
    }

    /// Tracks the peak number of units between start and finish.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl crate::progress::FetchProgressCallback for InFlight {
        fn on_unit_start(&self, _url: &str) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }
        fn on_unit_complete(&self, _url: &str, _o: crate::Orientation, _r: f64) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
        fn on_unit_error(&self, _url: &str, _e: &crate::FetchError) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    async fn run_with_limit(limit: usize) -> (usize, usize) {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        let names = ["a", "b", "c", "d", "e", "f"];
        serve_pngs(&server, &names, Duration::from_millis(100)).await;

        let tracker = Arc::new(InFlight::default());
        let config = FetchConfig::builder()
            .max_concurrency(limit)
            .progress_callback(tracker.clone())
            .build()
            .unwrap()
            .rooted_at(dir.path());
        let fetcher = ImageFetcher::from_config(&config).unwrap();
        fetcher.router().prepare().await.unwrap();

        let urls = names
            .iter()
            .map(|n| format!("{}/{n}.png", server.uri()))
            .collect();
        let outcomes: Vec<FetchOutcome> = fetch_stream(fetcher, urls, &config).collect().await;
        let ok = outcomes.iter().filter(|o| o.is_success()).count();
        (ok, tracker.peak.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn cap_bounds_in_flight_units() {
        let (ok, peak) = run_with_limit(2).await;
        assert_eq!(ok, 6);
        assert!(peak <= 2, "peak in flight was {peak}");
    }

    #[tokio::test]
    async fn zero_cap_dispatches_everything() {
        let (ok, peak) = run_with_limit(0).await;
        assert_eq!(ok, 6);
        assert_eq!(peak, 6);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let config = FetchConfig::default();
        let fetcher = ImageFetcher::from_config(&config).unwrap();
        let outcomes: Vec<FetchOutcome> = fetch_stream(fetcher, vec![], &config).collect().await;
        assert!(outcomes.is_empty());
    }
}
