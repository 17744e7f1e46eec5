//! Aspect-ratio extraction from a downloaded image's header.
//!
//! Only the header is parsed (`ImageReader::into_dimensions`), so a 40 MP
//! JPEG costs a few hundred bytes of I/O rather than a full decode. The
//! decoder is forced to the *declared* format: a PNG served as
//! `image/jpeg` is a decode error, not a silent success.
//!
//! Header parsing is blocking file I/O and runs inside `spawn_blocking`.

use crate::error::FetchError;
use crate::output::ImageMetadata;
use image::{ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The two raster encodings the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    Jpeg,
    Png,
}

impl ImageCodec {
    /// Map a declared `Content-Type` to a codec.
    ///
    /// Parameters (`; charset=…`) and case are ignored; anything other than
    /// `image/jpeg` or `image/png` is [`FetchError::UnsupportedFormat`].
    pub fn from_content_type(content_type: &str) -> Result<Self, FetchError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Ok(ImageCodec::Jpeg),
            "image/png" => Ok(ImageCodec::Png),
            _ => Err(FetchError::UnsupportedFormat {
                content_type: content_type.to_string(),
            }),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            ImageCodec::Jpeg => ImageFormat::Jpeg,
            ImageCodec::Png => ImageFormat::Png,
        }
    }
}

/// Read width and height from the file header using the given codec.
///
/// The file handle is owned by the reader and dropped on every return path.
pub fn read_dimensions(path: &Path, codec: ImageCodec) -> Result<(u32, u32), FetchError> {
    let file = File::open(path).map_err(|e| FetchError::io(path, e))?;
    let reader = ImageReader::with_format(BufReader::new(file), codec.image_format());
    let (width, height) = reader.into_dimensions().map_err(|e| FetchError::Decode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if width == 0 || height == 0 {
        return Err(FetchError::Decode {
            path: path.to_path_buf(),
            detail: format!("degenerate dimensions {width}x{height}"),
        });
    }
    Ok((width, height))
}

/// Probe `path` as `content_type` and return its metadata.
///
/// An unsupported `content_type` fails before the file is opened.
pub async fn extract_metadata(path: &Path, content_type: &str) -> Result<ImageMetadata, FetchError> {
    let codec = ImageCodec::from_content_type(content_type)?;
    let owned: PathBuf = path.to_path_buf();

    let (width, height) = tokio::task::spawn_blocking(move || read_dimensions(&owned, codec))
        .await
        .map_err(|e| FetchError::Decode {
            path: path.to_path_buf(),
            detail: format!("header probe panicked: {e}"),
        })??;

    debug!("{}: {}x{} ({:?})", path.display(), width, height, codec);

    Ok(ImageMetadata {
        width,
        height,
        content_type: content_type.to_string(),
    })
}

/// `width / height` of the image at `path`.
pub async fn aspect_ratio(path: &Path, content_type: &str) -> Result<f64, FetchError> {
    Ok(extract_metadata(path, content_type).await?.aspect_ratio())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode should succeed");
        buf
    }

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn content_type_mapping() {
        assert_eq!(ImageCodec::from_content_type("image/jpeg").unwrap(), ImageCodec::Jpeg);
        assert_eq!(ImageCodec::from_content_type("image/png").unwrap(), ImageCodec::Png);
        assert_eq!(
            ImageCodec::from_content_type("Image/PNG; charset=binary").unwrap(),
            ImageCodec::Png
        );
        assert!(matches!(
            ImageCodec::from_content_type("image/gif"),
            Err(FetchError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            ImageCodec::from_content_type(""),
            Err(FetchError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn landscape_png_ratio() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "wide.png", &encoded(1920, 1080, ImageFormat::Png));
        let ratio = aspect_ratio(&path, "image/png").await.unwrap();
        assert!((ratio - 1920.0 / 1080.0).abs() < 1e-9, "got {ratio}");
    }

    #[tokio::test]
    async fn portrait_jpeg_ratio() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tall.jpg", &encoded(108, 192, ImageFormat::Jpeg));
        let meta = extract_metadata(&path, "image/jpeg").await.unwrap();
        assert_eq!((meta.width, meta.height), (108, 192));
        assert!((meta.aspect_ratio() - 0.5625).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unsupported_type_fails_without_reading() {
        // The file does not even exist: the type check comes first.
        let err = aspect_ratio(Path::new("/nonexistent/a.gif"), "image/gif")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn truncated_png_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let bytes = encoded(64, 32, ImageFormat::Png);
        let path = write(&dir, "cut.png", &bytes[..12]);
        let err = aspect_ratio(&path, "image/png").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn mismatched_header_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "liar.jpg", &encoded(64, 32, ImageFormat::Png));
        let err = aspect_ratio(&path, "image/jpeg").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.jpg", &[]);
        let err = aspect_ratio(&path, "image/jpeg").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }), "got {err:?}");
    }
}
