//! Share pipeline: upload, then encode, with observable state
//!
//! `Idle -> Uploading -> Encoding -> Ready`, or `Failed` from `Idle`
//! (empty selection) and `Uploading` (an upload failed). `Ready` and
//! `Failed` go back to `Idle` only through [`SharePipeline::reset`].

use tokio::sync::watch;

use crate::models::{LocalImage, PipelineState, UploadProgress};
use crate::token::{ShareLink, TokenError};
use crate::upload::{AssetHost, UploadError, UploadOrchestrator};

/// Errors surfaced at the pipeline boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// Share was triggered without any selected images
    EmptyBatch,
    /// The upload at `position` (1-based) failed
    UploadFailed { position: usize, reason: String },
    /// A presented token could not be decoded
    MalformedShareToken(String),
    /// The URL list could not be encoded
    Encoding(String),
    /// A share attempt is uploading or encoding
    Busy(&'static str),
    /// The previous attempt finished and has not been reset yet
    NotIdle(&'static str),
    /// The share attempt was dropped before it finished
    Cancelled,
}

impl std::fmt::Display for ShareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareError::EmptyBatch => write!(f, "No photos selected"),
            ShareError::UploadFailed { position, reason } => {
                write!(f, "Upload of photo {} failed: {}", position, reason)
            }
            ShareError::MalformedShareToken(msg) => write!(f, "Malformed share token: {}", msg),
            ShareError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            ShareError::Busy(state) => write!(f, "Pipeline is busy ({})", state),
            ShareError::NotIdle(state) => write!(f, "Pipeline is {}, not idle", state),
            ShareError::Cancelled => write!(f, "Share attempt cancelled"),
        }
    }
}

impl std::error::Error for ShareError {}

impl From<UploadError> for ShareError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::EmptyBatch => ShareError::EmptyBatch,
            UploadError::UploadFailed { position, reason } => {
                ShareError::UploadFailed { position, reason }
            }
        }
    }
}

impl From<TokenError> for ShareError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => ShareError::Encoding(msg),
            TokenError::Malformed(msg) => ShareError::MalformedShareToken(msg),
        }
    }
}

/// User-facing messages
impl ShareError {
    pub fn user_message(&self) -> String {
        match self {
            ShareError::EmptyBatch => "Please add some photos first.".to_string(),
            ShareError::UploadFailed { position, .. } => {
                format!("Photo {} failed to upload.", position)
            }
            ShareError::MalformedShareToken(_) => "This share link is broken.".to_string(),
            ShareError::Busy(_) => "A share link is already being generated.".to_string(),
            ShareError::NotIdle(_) => "Start over before sharing again.".to_string(),
            ShareError::Encoding(_) | ShareError::Cancelled => {
                "Sharing failed, please try again.".to_string()
            }
        }
    }

    /// Whether the user can sensibly retry after this error
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ShareError::MalformedShareToken(_) | ShareError::Busy(_))
    }
}

/// Decodes a shared link (or a bare token) into its photo URLs
pub fn open_shared(link_or_token: &str) -> Result<Vec<String>, ShareError> {
    let urls = if link_or_token.contains('?') {
        ShareLink::parse(link_or_token)?
    } else {
        crate::token::decode_token(link_or_token)?
    };
    Ok(urls)
}

/// Moves a dropped in-flight attempt to `Failed(Cancelled)`
struct AttemptGuard<'a> {
    state: &'a watch::Sender<PipelineState>,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_if_modified(|state| {
                if state.is_busy() {
                    *state = PipelineState::Failed(ShareError::Cancelled);
                    true
                } else {
                    false
                }
            });
        }
    }
}

/// Drives one share attempt at a time from images to a share link
pub struct SharePipeline<H: AssetHost> {
    orchestrator: UploadOrchestrator<H>,
    link_base: String,
    state: watch::Sender<PipelineState>,
}

impl<H: AssetHost> SharePipeline<H> {
    /// Create a pipeline producing links under `link_base`
    pub fn new(orchestrator: UploadOrchestrator<H>, link_base: impl Into<String>) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            orchestrator,
            link_base: link_base.into(),
            state,
        }
    }

    /// Receiver that observes every state change, including progress
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn link_base(&self) -> &str {
        &self.link_base
    }

    /// Uploads the images and returns the share link
    ///
    /// Only starts from `Idle`. Returns `Busy` while another attempt runs
    /// and `NotIdle` from `Ready`/`Failed`, leaving the state untouched.
    /// Every other error also ends in `Failed`.
    pub async fn share(&self, images: Vec<LocalImage>) -> Result<ShareLink, ShareError> {
        let total = images.len();
        let mut refused = None;
        self.state.send_if_modified(|state| {
            if *state != PipelineState::Idle {
                refused = Some(if state.is_busy() {
                    ShareError::Busy(state.name())
                } else {
                    ShareError::NotIdle(state.name())
                });
                return false;
            }
            *state = if total == 0 {
                PipelineState::Failed(ShareError::EmptyBatch)
            } else {
                PipelineState::Uploading(UploadProgress {
                    completed: 0,
                    total,
                })
            };
            true
        });

        if let Some(err) = refused {
            log::warn!("Share refused: {}", err);
            return Err(err);
        }
        if total == 0 {
            log::warn!("Share requested without photos");
            return Err(ShareError::EmptyBatch);
        }

        let mut guard = AttemptGuard {
            state: &self.state,
            armed: true,
        };

        let result = self.run(images).await;
        guard.armed = false;

        match &result {
            Ok(link) => {
                log::info!("Share link ready ({} bytes token)", link.token().len());
                self.state.send_replace(PipelineState::Ready(link.clone()));
            }
            Err(e) => {
                log::error!("Share failed: {}", e);
                self.state.send_replace(PipelineState::Failed(e.clone()));
            }
        }
        result
    }

    async fn run(&self, images: Vec<LocalImage>) -> Result<ShareLink, ShareError> {
        let urls = self
            .orchestrator
            .upload_all(images, |progress| {
                self.state.send_replace(PipelineState::Uploading(progress));
            })
            .await?;

        self.state.send_replace(PipelineState::Encoding);
        Ok(ShareLink::compose(&self.link_base, &urls)?)
    }

    /// Discards a finished attempt and returns to `Idle`
    ///
    /// Fails with `Busy` while an attempt is uploading or encoding.
    pub fn reset(&self) -> Result<(), ShareError> {
        let mut refused = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                refused = Some(state.name());
                return false;
            }
            let changed = *state != PipelineState::Idle;
            *state = PipelineState::Idle;
            changed
        });
        match refused {
            Some(current) => Err(ShareError::Busy(current)),
            None => Ok(()),
        }
    }

    /// Resets a finished attempt and starts a fresh one
    pub async fn retry(&self, images: Vec<LocalImage>) -> Result<ShareLink, ShareError> {
        self.reset()?;
        self.share(images).await
    }
}
