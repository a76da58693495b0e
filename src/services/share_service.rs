use cloudinary_upload::CloudinaryClient;
use share_pipeline::{
    load_images, LocalImage, PipelineState, ShareError, ShareLink, SharePipeline, UploadConfig,
    UploadOrchestrator,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::AppError;

/// One-line status text for a pipeline state
pub fn describe_state(state: &PipelineState) -> String {
    match state {
        PipelineState::Idle => "Preparing upload...".to_string(),
        PipelineState::Uploading(progress) => format!(
            "Uploading photos ({}/{})...",
            progress.completed, progress.total
        ),
        PipelineState::Encoding => "Generating share link...".to_string(),
        PipelineState::Ready(_) => "Share link ready".to_string(),
        PipelineState::Failed(e) => e.user_message(),
    }
}

/// Runs one attempt while printing every observed state change
async fn drive<F>(
    pipeline: &SharePipeline<CloudinaryClient>,
    attempt: F,
) -> Result<ShareLink, ShareError>
where
    F: std::future::Future<Output = Result<ShareLink, ShareError>>,
{
    let mut rx = pipeline.subscribe();
    tokio::pin!(attempt);

    loop {
        tokio::select! {
            result = &mut attempt => break result,
            changed = rx.changed() => {
                if changed.is_ok() {
                    let state = rx.borrow_and_update().clone();
                    if state.is_busy() {
                        eprintln!("{}", describe_state(&state));
                    }
                }
            }
        }
    }
}

fn prompt_retry() -> bool {
    eprint!("Retry? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Loads the selected photos, uploads them and returns the share link
///
/// When `interactive` is set, a failed attempt offers a retry with a fresh
/// batch of the same photos.
pub async fn run_share(
    config: &AppConfig,
    photos: &[PathBuf],
    interactive: bool,
) -> Result<ShareLink, AppError> {
    eprintln!("{}", describe_state(&PipelineState::Idle));
    let images: Vec<LocalImage> = load_images(photos).await?;
    log::info!("Selected {} photos", images.len());

    let client = CloudinaryClient::new(config.cloudinary.clone())?;
    let orchestrator = UploadOrchestrator::new(
        client,
        UploadConfig {
            max_concurrent: config.share.max_concurrent,
        },
    );
    let pipeline = SharePipeline::new(orchestrator, config.share.base_url.clone());

    let mut result = drive(&pipeline, pipeline.share(images.clone())).await;
    loop {
        match result {
            Ok(link) => return Ok(link),
            Err(e) => {
                if !(interactive && e.is_retryable() && !images.is_empty()) {
                    return Err(e.into());
                }
                eprintln!("{}", e.user_message());
                if !prompt_retry() {
                    return Err(e.into());
                }
                log::info!("Retrying share with {} photos", images.len());
                result = drive(&pipeline, pipeline.retry(images.clone())).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_pipeline::UploadProgress;

    #[test]
    fn test_describe_state() {
        assert_eq!(
            describe_state(&PipelineState::Uploading(UploadProgress {
                completed: 1,
                total: 3
            })),
            "Uploading photos (1/3)..."
        );
        assert_eq!(
            describe_state(&PipelineState::Encoding),
            "Generating share link..."
        );
        assert_eq!(
            describe_state(&PipelineState::Failed(ShareError::EmptyBatch)),
            "Please add some photos first."
        );
    }

    #[tokio::test]
    async fn test_run_share_without_photos_fails_before_upload() {
        let config = AppConfig::from_toml(
            r#"
            [share]
            base_url = "https://tree.example.com/"

            [cloudinary]
            cloud_name = "demo"
            upload_preset = "tree_preset"
            api_base = "http://127.0.0.1:9"
            "#,
        )
        .unwrap();

        let err = run_share(&config, &[], false).await.unwrap_err();
        assert!(matches!(err, AppError::Share(ShareError::EmptyBatch)));
    }
}
