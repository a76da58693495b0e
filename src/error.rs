use cloudinary_upload::CloudinaryError;
use share_pipeline::{IngestError, ShareError};
use std::fmt;

/// Central error type for the treeshare app
#[derive(Debug)]
pub enum AppError {
    /// Invalid or unreadable configuration
    Config(String),
    /// Selected files could not be read
    Ingest(IngestError),
    /// Asset host client could not be set up
    Host(CloudinaryError),
    /// Share pipeline ended in `Failed`
    Share(ShareError),
    /// Copying the link failed; never affects the pipeline
    ClipboardUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Ingest(e) => write!(f, "Ingest error: {}", e),
            AppError::Host(e) => write!(f, "Asset host error: {}", e),
            AppError::Share(e) => write!(f, "Share error: {}", e),
            AppError::ClipboardUnavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::Ingest(e)
    }
}

impl From<CloudinaryError> for AppError {
    fn from(e: CloudinaryError) -> Self {
        AppError::Host(e)
    }
}

impl From<ShareError> for AppError {
    fn from(e: ShareError) -> Self {
        AppError::Share(e)
    }
}

/// User-friendly error messages for the terminal
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(msg) => format!("Please check your configuration: {}", msg),
            AppError::Ingest(e) => format!("Could not read the selected photos. {}", e),
            AppError::Host(e) => format!("Could not reach the photo host. {}", e),
            AppError::Share(e) => e.user_message(),
            AppError::ClipboardUnavailable(_) => "Could not copy the link.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_errors_use_pipeline_wording() {
        let err = AppError::from(ShareError::UploadFailed {
            position: 2,
            reason: "Rejected".to_string(),
        });
        assert_eq!(err.user_message(), "Photo 2 failed to upload.");

        let err = AppError::from(ShareError::EmptyBatch);
        assert_eq!(err.user_message(), "Please add some photos first.");
    }
}
