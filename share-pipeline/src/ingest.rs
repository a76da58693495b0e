//! Reading selected files into memory
//!
//! All files are read concurrently and joined once, so the upload
//! orchestrator always starts from a complete, ordered image list.

use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use crate::models::LocalImage;

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while reading selected files
#[derive(Debug)]
pub enum IngestError {
    IoError { path: PathBuf, source: std::io::Error },
    Other(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::IoError { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            IngestError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::IoError { source, .. } => Some(source),
            IngestError::Other(_) => None,
        }
    }
}

/// Loads the given files as images, preserving selection order
///
/// Files that are not images are skipped with a warning; the remaining
/// images get consecutive indices. An unreadable file fails the whole load.
pub async fn load_images<P: AsRef<Path>>(paths: &[P]) -> IngestResult<Vec<LocalImage>> {
    let mut join_set = JoinSet::new();

    for (slot, path) in paths.iter().enumerate() {
        let path = path.as_ref().to_path_buf();
        join_set.spawn(async move {
            let data = tokio::fs::read(&path).await;
            (slot, path, data)
        });
    }

    let mut slots: Vec<Option<(PathBuf, Vec<u8>)>> = vec![None; paths.len()];
    while let Some(joined) = join_set.join_next().await {
        let (slot, path, data) =
            joined.map_err(|e| IngestError::Other(format!("Read task failed: {}", e)))?;
        let data = data.map_err(|source| IngestError::IoError {
            path: path.clone(),
            source,
        })?;
        slots[slot] = Some((path, data));
    }

    let mut images = Vec::with_capacity(slots.len());
    for (path, data) in slots.into_iter().flatten() {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        match LocalImage::from_bytes(images.len(), file_name, data) {
            Some(image) => images.push(image),
            None => log::warn!("Skipping {}: not an image", path.display()),
        }
    }

    log::debug!("Loaded {} of {} selected files", images.len(), paths.len());
    Ok(images)
}
