//! Image fetcher: one unit of work from URL to routed file.
//!
//! ## Steps
//!
//! ```text
//! name ─▶ create ─▶ HEAD ─▶ GET (streamed) ─▶ extract ─▶ route
//! ```
//!
//! The naming step runs before any I/O, so a URL without a final path
//! segment never touches the network. Once the working file exists, a
//! failure leaves it in `work_dir` unless `cleanup_on_failure` is set.

use crate::config::FetchConfig;
use crate::error::{FetchError, WallsortError};
use crate::output::FetchedImage;
use crate::pipeline::extract;
use crate::pipeline::route::PlacementRouter;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Headers reported by the HEAD probe.
#[derive(Debug, Clone, Default)]
pub struct HeadProbe {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Derive the local file name from the URL's final path segment.
///
/// Fails with [`FetchError::Naming`] when the URL does not parse or its path
/// ends in `/`.
pub fn filename_from_url(url: &str) -> Result<String, FetchError> {
    let naming = || FetchError::Naming {
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| naming())?;
    let last = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .ok_or_else(naming)?;
    if last.is_empty() || last == "." || last == ".." {
        return Err(naming());
    }
    Ok(last.to_string())
}

/// Build the shared HTTP client used by every unit of work.
///
/// No request timeout is set: a unit runs until the server finishes or
/// the connection drops.
pub fn build_client(config: &FetchConfig) -> Result<Client, WallsortError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| WallsortError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Downloads, classifies and routes single images.
///
/// Cheap to clone; the inner [`Client`] is reference-counted and shared
/// read-only across every concurrent unit.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    work_dir: PathBuf,
    router: PlacementRouter,
    cleanup_on_failure: bool,
}

impl ImageFetcher {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            work_dir: config.work_dir.clone(),
            router: PlacementRouter::new(config.horizontal_dir.clone(), config.vertical_dir.clone()),
            cleanup_on_failure: config.cleanup_on_failure,
        }
    }

    /// Build a fetcher with its own client from `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self, WallsortError> {
        Ok(Self::new(build_client(config)?, config))
    }

    pub fn router(&self) -> &PlacementRouter {
        &self.router
    }

    /// Run one full unit of work for `url`.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let filename = filename_from_url(url)?;
        let path = self.work_dir.join(&filename);
        let file = create_file(&path).await?;

        let result = self.fill_and_place(url, &path, file).await;
        if result.is_err() && self.cleanup_on_failure {
            discard(&path).await;
        }
        result
    }

    async fn fill_and_place(
        &self,
        url: &str,
        path: &Path,
        file: File,
    ) -> Result<FetchedImage, FetchError> {
        let probe = self.probe(url).await?;
        let content_type = probe.content_type.clone().unwrap_or_default();

        let bytes_written = self.download(url, path, file).await?;

        let metadata = extract::extract_metadata(path, &content_type).await?;
        let ratio = metadata.aspect_ratio();
        let orientation = metadata.orientation();

        let placed = self.router.place(path, orientation).await?;

        info!(
            "Getting image {}, length: {}, type: {}, aspect ratio: {:.6}",
            url,
            probe
                .content_length
                .map(|n| n.to_string())
                .unwrap_or_default(),
            content_type,
            ratio
        );

        Ok(FetchedImage {
            url: url.to_string(),
            path: placed,
            metadata,
            orientation,
            declared_length: probe.content_length,
            bytes_written,
        })
    }

    /// HEAD `url` for its declared type and length.
    pub async fn probe(&self, url: &str) -> Result<HeadProbe, FetchError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::network(url, e))?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        debug!("HEAD {}: type={:?} length={:?}", url, content_type, content_length);
        Ok(HeadProbe {
            content_type,
            content_length,
        })
    }

    /// Stream the body of `url` into `file`, returning the byte count.
    async fn download(&self, url: &str, path: &Path, mut file: File) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::network(url, e))?;

        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(path, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| FetchError::io(path, e))?;

        debug!("Downloaded {} bytes → {}", written, path.display());
        Ok(written)
    }
}

/// Create the working file, refusing to overwrite an existing one.
async fn create_file(path: &Path) -> Result<File, FetchError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| FetchError::io(path, e))
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove partial download {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Orientation;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    async fn serve(server: &MockServer, route: &str, content_type: &str, body: Vec<u8>) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", content_type))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", content_type)
                    .set_body_bytes(body),
            )
            .mount(server)
            .await;
    }

    async fn fetcher(dir: &TempDir, cleanup: bool) -> ImageFetcher {
        let config = FetchConfig::builder()
            .cleanup_on_failure(cleanup)
            .build()
            .unwrap()
            .rooted_at(dir.path());
        let fetcher = ImageFetcher::from_config(&config).unwrap();
        fetcher.router().prepare().await.unwrap();
        fetcher
    }

    #[test]
    fn filename_from_last_segment() {
        assert_eq!(
            filename_from_url("https://i.redd.it/abc123.jpg").unwrap(),
            "abc123.jpg"
        );
        assert_eq!(
            filename_from_url("https://i.imgur.com/a/b/c.png?x=1").unwrap(),
            "c.png"
        );
    }

    #[test]
    fn filename_requires_a_segment() {
        for url in ["https://example.com/", "https://example.com", "https://example.com/dir/", "", "nope"] {
            assert!(
                matches!(filename_from_url(url), Err(FetchError::Naming { .. })),
                "{url:?} should fail naming"
            );
        }
    }

    #[tokio::test]
    async fn landscape_png_lands_in_hori() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        serve(&server, "/wide.png", "image/png", encoded(1920, 1080, ImageFormat::Png)).await;

        let f = fetcher(&dir, false).await;
        let image = f.fetch(&format!("{}/wide.png", server.uri())).await.unwrap();

        assert_eq!(image.orientation, Orientation::Horizontal);
        assert_eq!(image.path, dir.path().join("hori/wide.png"));
        assert!(image.path.exists());
        assert!(!dir.path().join("wide.png").exists());
        assert!(image.bytes_written > 0);
    }

    #[tokio::test]
    async fn square_jpeg_lands_in_vert() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        serve(&server, "/sq.jpg", "image/jpeg", encoded(64, 64, ImageFormat::Jpeg)).await;

        let image = fetcher(&dir, false)
            .await
            .fetch(&format!("{}/sq.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(image.orientation, Orientation::Vertical);
        assert!(dir.path().join("vert/sq.jpg").exists());
    }

    #[tokio::test]
    async fn naming_failure_makes_no_request() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetcher(&dir, false)
            .await
            .fetch(&format!("{}/", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Naming { .. }));
    }

    #[tokio::test]
    async fn missing_download_is_network_error_and_left_in_place() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(&dir, false)
            .await
            .fetch(&format!("{}/gone.jpg", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }), "got {err:?}");
        assert!(dir.path().join("gone.jpg").exists());
        assert!(!dir.path().join("vert/gone.jpg").exists());
        assert!(!dir.path().join("hori/gone.jpg").exists());
    }

    #[tokio::test]
    async fn cleanup_policy_removes_working_file() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher(&dir, true)
            .await
            .fetch(&format!("{}/gone.jpg", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert!(!dir.path().join("gone.jpg").exists());
    }

    #[tokio::test]
    async fn unsupported_type_is_not_routed() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        serve(&server, "/anim.gif", "image/gif", b"GIF89a....".to_vec()).await;

        let err = fetcher(&dir, false)
            .await
            .fetch(&format!("{}/anim.gif", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedFormat { .. }));
        assert!(dir.path().join("anim.gif").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("hori")).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(dir.path().join("vert")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn corrupt_body_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        let mut body = encoded(300, 200, ImageFormat::Png);
        body.truncate(10);
        serve(&server, "/cut.png", "image/png", body).await;

        let err = fetcher(&dir, false)
            .await
            .fetch(&format!("{}/cut.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn existing_working_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("taken.jpg"), b"mine").unwrap();

        let err = fetcher(&dir, true)
            .await
            .fetch("https://example.invalid/taken.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
        // Someone else's file survives even with cleanup on.
        assert_eq!(std::fs::read(dir.path().join("taken.jpg")).unwrap(), b"mine");
    }
}
