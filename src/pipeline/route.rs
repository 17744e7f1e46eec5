//! Placement: move a fetched file into the horizontal or vertical directory.

use crate::error::{FetchError, WallsortError};
use crate::output::Orientation;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed pair of orientation destinations.
#[derive(Debug, Clone)]
pub struct PlacementRouter {
    horizontal: PathBuf,
    vertical: PathBuf,
}

impl PlacementRouter {
    pub fn new(horizontal: impl Into<PathBuf>, vertical: impl Into<PathBuf>) -> Self {
        Self {
            horizontal: horizontal.into(),
            vertical: vertical.into(),
        }
    }

    /// Create both destinations. Existing directories are fine.
    pub async fn prepare(&self) -> Result<(), WallsortError> {
        for dir in [&self.horizontal, &self.vertical] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| WallsortError::DestinationSetup {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn destination_for(&self, orientation: Orientation) -> &Path {
        match orientation {
            Orientation::Horizontal => &self.horizontal,
            Orientation::Vertical => &self.vertical,
        }
    }

    /// Move `path` into the destination for `orientation`, keeping its file name.
    ///
    /// Never replaces a file already in the destination: the move is a hard
    /// link followed by removing `path`, and linking onto an existing name
    /// fails. On failure the file stays where it was. Cross-device moves fail
    /// with [`FetchError::Io`].
    pub async fn place(&self, path: &Path, orientation: Orientation) -> Result<PathBuf, FetchError> {
        let file_name = path.file_name().ok_or_else(|| FetchError::Io {
            path: path.to_path_buf(),
            detail: "path has no file name".into(),
        })?;
        let target = self.destination_for(orientation).join(file_name);

        tokio::fs::hard_link(path, &target)
            .await
            .map_err(|e| FetchError::io(&target, e))?;

        if let Err(e) = tokio::fs::remove_file(path).await {
            // Undo the link so the unit is either placed or not.
            if let Err(undo) = tokio::fs::remove_file(&target).await {
                warn!("Failed to unlink {}: {}", target.display(), undo);
            }
            return Err(FetchError::io(path, e));
        }

        debug!("Placed {} → {}", path.display(), target.display());
        Ok(target)
    }
}
