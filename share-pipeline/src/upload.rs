//! Concurrent upload of a batch of images to an asset host
//!
//! Every image of a batch is uploaded by its own task on a `JoinSet`. The
//! batch fails as soon as one upload fails; remaining uploads are aborted
//! and their results discarded.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::models::{LocalImage, UploadBatch, UploadProgress};

/// Failure reported by an asset host for a single upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Network(String),
    Timeout,
    Rejected(String),
    InvalidResponse(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Network(msg) => write!(f, "Network error: {}", msg),
            HostError::Timeout => write!(f, "Upload timed out"),
            HostError::Rejected(msg) => write!(f, "Rejected by host: {}", msg),
            HostError::InvalidResponse(msg) => write!(f, "Invalid host response: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// A remote service that durably stores images
///
/// Implementations carry their own destination identity (account, preset,
/// folder) and return a stable URL for each stored image.
#[async_trait]
pub trait AssetHost: Send + Sync + 'static {
    /// Human-readable description of the upload destination, for logs
    fn target(&self) -> String;

    async fn upload(&self, image: &LocalImage) -> Result<String, HostError>;
}

/// Result type for batch uploads
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur during a batch upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// No images were given
    EmptyBatch,
    /// The upload at `position` (1-based) failed
    UploadFailed { position: usize, reason: String },
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::EmptyBatch => write!(f, "No images to upload"),
            UploadError::UploadFailed { position, reason } => {
                write!(f, "Upload of image {} failed: {}", position, reason)
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// Configuration for batch uploads
#[derive(Debug, Clone, Default)]
pub struct UploadConfig {
    /// Maximum uploads in flight at once; `None` submits the whole batch
    pub max_concurrent: Option<usize>,
}

type TaskOutput = (usize, Result<String, HostError>);

/// Fans a batch of images out to an asset host and collects the URLs
pub struct UploadOrchestrator<H: AssetHost> {
    host: Arc<H>,
    config: UploadConfig,
}

impl<H: AssetHost> UploadOrchestrator<H> {
    pub fn new(host: H, config: UploadConfig) -> Self {
        Self {
            host: Arc::new(host),
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Uploads all images and returns their URLs in input order
    ///
    /// `on_progress` is called after every finished upload with the
    /// completed and total counts. On the first failure the remaining
    /// uploads are aborted; if several failures are already known at that
    /// point, the lowest position is reported.
    pub async fn upload_all<F>(
        &self,
        images: Vec<LocalImage>,
        mut on_progress: F,
    ) -> UploadResult<Vec<String>>
    where
        F: FnMut(UploadProgress),
    {
        if images.is_empty() {
            return Err(UploadError::EmptyBatch);
        }

        let mut batch = UploadBatch::new(images.len());
        log::info!(
            "Uploading {} images to {} (batch {})",
            batch.total(),
            self.host.target(),
            batch.id()
        );

        let mut join_set: JoinSet<TaskOutput> = JoinSet::new();
        let mut positions: HashMap<tokio::task::Id, usize> = HashMap::new();
        let limit = self.config.max_concurrent.filter(|n| *n > 0);

        for (position, image) in images.into_iter().enumerate() {
            if let Some(limit) = limit {
                while join_set.len() >= limit {
                    if let Some(joined) = join_set.join_next_with_id().await {
                        let failed =
                            Self::record(&mut batch, &mut positions, joined, &mut on_progress);
                        if let Some(failed) = failed {
                            return Err(Self::fail(batch, &mut join_set, &mut positions, failed));
                        }
                    }
                }
            }

            let host = self.host.clone();
            batch.mark_in_flight(position);
            let handle = join_set.spawn(async move {
                let result = host.upload(&image).await;
                (position, result)
            });
            positions.insert(handle.id(), position);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            if let Some(failed) = Self::record(&mut batch, &mut positions, joined, &mut on_progress) {
                return Err(Self::fail(batch, &mut join_set, &mut positions, failed));
            }
        }

        let batch_id = batch.id();
        if let Some(task) = batch.tasks().iter().find(|task| !task.state.is_finished()) {
            return Err(UploadError::UploadFailed {
                position: task.position + 1,
                reason: "upload never finished".to_string(),
            });
        }
        let urls = batch.into_urls().unwrap_or_default();
        log::info!("Batch {} uploaded {} images", batch_id, urls.len());
        Ok(urls)
    }

    /// Writes one joined task into its slot; returns its position if it failed
    fn record<F>(
        batch: &mut UploadBatch,
        positions: &mut HashMap<tokio::task::Id, usize>,
        joined: Result<(tokio::task::Id, TaskOutput), tokio::task::JoinError>,
        on_progress: &mut F,
    ) -> Option<usize>
    where
        F: FnMut(UploadProgress),
    {
        let (position, outcome) = match joined {
            Ok((id, (position, result))) => {
                positions.remove(&id);
                (position, result.map_err(|e| e.to_string()))
            }
            Err(join_error) => {
                let position = positions.remove(&join_error.id())?;
                (position, Err(format!("upload task failed: {}", join_error)))
            }
        };

        let failed = outcome.is_err();
        match &outcome {
            Ok(url) => log::debug!("Image {} uploaded: {}", position + 1, url),
            Err(reason) => log::warn!("Image {} failed to upload: {}", position + 1, reason),
        }

        on_progress(batch.complete(position, outcome));
        failed.then_some(position)
    }

    /// Collects failures that already finished, aborts the rest and builds
    /// the batch error for the lowest failed position
    fn fail(
        mut batch: UploadBatch,
        join_set: &mut JoinSet<TaskOutput>,
        positions: &mut HashMap<tokio::task::Id, usize>,
        failed: usize,
    ) -> UploadError {
        while let Some(joined) = join_set.try_join_next_with_id() {
            Self::record(&mut batch, positions, joined, &mut |_: UploadProgress| {});
        }
        join_set.abort_all();

        let (position, reason) = batch
            .first_failure()
            .map(|(position, reason)| (position, reason.to_string()))
            .unwrap_or((failed, String::new()));

        log::error!(
            "Batch {} failed at image {} of {}: {}",
            batch.id(),
            position + 1,
            batch.total(),
            reason
        );
        UploadError::UploadFailed {
            position: position + 1,
            reason,
        }
    }
}
