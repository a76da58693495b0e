use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::token::ShareLink;

/// An image selected by the user, held in memory until it is uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct LocalImage {
    index: usize,
    file_name: Option<String>,
    mime_type: &'static str,
    data: Vec<u8>,
}

impl LocalImage {
    /// Wraps raw file contents if they look like an image
    ///
    /// The format is sniffed from the magic bytes first, then from the
    /// HEIF/AVIF `ftyp` brand, then guessed from the file extension.
    /// Returns `None` only when none of these marks the file as an image.
    pub fn from_bytes(index: usize, file_name: Option<String>, data: Vec<u8>) -> Option<Self> {
        let mime_type = image::guess_format(&data)
            .ok()
            .map(|format| format.to_mime_type())
            .or_else(|| sniff_ftyp_brand(&data))
            .or_else(|| file_name.as_deref().and_then(guess_mime_from_ext))?;
        Some(Self {
            index,
            file_name,
            mime_type,
            data,
        })
    }

    /// Selection order among the images of one share attempt (0-based)
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Name to send to the asset host, falling back to the position
    pub fn upload_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("image-{}", self.index + 1),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

}

/// MIME type of an ISO-BMFF image container (HEIC, AVIF) by its major brand
fn sniff_ftyp_brand(data: &[u8]) -> Option<&'static str> {
    if data.get(4..8)? != b"ftyp" {
        return None;
    }
    match data.get(8..12)? {
        b"heic" | b"heix" | b"heim" | b"heis" | b"hevc" | b"hevx" | b"mif1" | b"msf1" => {
            Some("image/heic")
        }
        b"avif" | b"avis" => Some("image/avif"),
        _ => None,
    }
}

/// Image MIME type guessed from the file extension
fn guess_mime_from_ext(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" | "heif" => Some("image/heic"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        "tif" | "tiff" => Some("image/tiff"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

/// Lifecycle of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded(String), // remote URL
    Failed(String),    // reason
}

impl TaskState {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskState::Succeeded(_) | TaskState::Failed(_))
    }
}

/// One image's upload attempt inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Position in the submitted batch (0-based)
    pub position: usize,
    pub state: TaskState,
}

/// Progress signal `(completed, total)` while uploading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub completed: usize,
    pub total: usize,
}

/// Per-state task counts of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_flight + self.succeeded + self.failed
    }
}

/// All upload tasks of one share attempt
///
/// Results are written into index-addressed slots, so the URL order follows
/// the submission order no matter in which order uploads complete.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    id: Uuid,
    tasks: Vec<UploadTask>,
    completed: usize,
}

impl UploadBatch {
    pub fn new(total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasks: (0..total)
                .map(|position| UploadTask {
                    position,
                    state: TaskState::Pending,
                })
                .collect(),
            completed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    pub fn mark_in_flight(&mut self, position: usize) {
        if let Some(task) = self.tasks.get_mut(position) {
            if task.state == TaskState::Pending {
                task.state = TaskState::InFlight;
            }
        }
    }

    /// Records the outcome of one task and returns the new progress
    ///
    /// A task that already finished keeps its first outcome.
    pub fn complete(&mut self, position: usize, outcome: Result<String, String>) -> UploadProgress {
        if let Some(task) = self.tasks.get_mut(position) {
            if !task.state.is_finished() {
                task.state = match outcome {
                    Ok(url) => TaskState::Succeeded(url),
                    Err(reason) => TaskState::Failed(reason),
                };
                self.completed += 1;
            }
        }
        self.progress()
    }

    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            completed: self.completed,
            total: self.tasks.len(),
        }
    }

    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for task in &self.tasks {
            match task.state {
                TaskState::Pending => counts.pending += 1,
                TaskState::InFlight => counts.in_flight += 1,
                TaskState::Succeeded(_) => counts.succeeded += 1,
                TaskState::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// Failed task with the lowest position, with its reason
    pub fn first_failure(&self) -> Option<(usize, &str)> {
        self.tasks.iter().find_map(|task| match &task.state {
            TaskState::Failed(reason) => Some((task.position, reason.as_str())),
            _ => None,
        })
    }

    /// URLs in submission order, only if every task succeeded
    pub fn into_urls(self) -> Option<Vec<String>> {
        self.tasks
            .into_iter()
            .map(|task| match task.state {
                TaskState::Succeeded(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

/// Lifecycle of one user-initiated share action
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Uploading(UploadProgress),
    Encoding,
    Ready(ShareLink),
    Failed(crate::pipeline::ShareError),
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Uploading(_) => "uploading",
            PipelineState::Encoding => "encoding",
            PipelineState::Ready(_) => "ready",
            PipelineState::Failed(_) => "failed",
        }
    }

    /// True while a share attempt is running
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Uploading(_) | PipelineState::Encoding)
    }

    /// The share link, only when the state is exactly `Ready`
    pub fn share_link(&self) -> Option<&ShareLink> {
        match self {
            PipelineState::Ready(link) => Some(link),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_local_image_sniffs_format() {
        let image = LocalImage::from_bytes(0, Some("a.png".to_string()), PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.upload_name(), "a.png");

        let jpeg = LocalImage::from_bytes(2, None, vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).unwrap();
        assert_eq!(jpeg.mime_type(), "image/jpeg");
        assert_eq!(jpeg.upload_name(), "image-3");

        assert!(LocalImage::from_bytes(0, None, b"hello world".to_vec()).is_none());
    }

    #[test]
    fn test_local_image_accepts_heic_and_svg() {
        let heic = b"\0\0\0\x18ftypheic\0\0\0\0mif1heic".to_vec();
        let image = LocalImage::from_bytes(0, None, heic).unwrap();
        assert_eq!(image.mime_type(), "image/heic");

        let avif = b"\0\0\0\x1cftypavif\0\0\0\0avifmif1".to_vec();
        assert_eq!(
            LocalImage::from_bytes(0, None, avif).unwrap().mime_type(),
            "image/avif"
        );

        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#.to_vec();
        let image = LocalImage::from_bytes(0, Some("Star.SVG".to_string()), svg.clone()).unwrap();
        assert_eq!(image.mime_type(), "image/svg+xml");
        assert!(LocalImage::from_bytes(0, None, svg).is_none());

        assert!(LocalImage::from_bytes(0, Some("notes.txt".to_string()), b"text".to_vec()).is_none());
    }

    #[test]
    fn test_batch_counts_always_sum_to_total() {
        let mut batch = UploadBatch::new(4);
        assert_eq!(batch.counts().pending, 4);

        batch.mark_in_flight(0);
        batch.mark_in_flight(1);
        batch.mark_in_flight(2);
        assert_eq!(batch.counts().total(), 4);

        batch.complete(1, Ok("u1".to_string()));
        batch.complete(2, Err("boom".to_string()));
        let counts = batch.counts();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.in_flight, 1);
        assert_eq!(counts.succeeded, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(batch.progress(), UploadProgress { completed: 2, total: 4 });
    }

    #[test]
    fn test_batch_keeps_first_outcome() {
        let mut batch = UploadBatch::new(1);
        batch.complete(0, Ok("first".to_string()));
        let progress = batch.complete(0, Err("late".to_string()));
        assert_eq!(progress.completed, 1);
        assert_eq!(batch.into_urls(), Some(vec!["first".to_string()]));
    }

    #[test]
    fn test_batch_urls_follow_positions() {
        let mut batch = UploadBatch::new(3);
        batch.complete(2, Ok("c".to_string()));
        batch.complete(0, Ok("a".to_string()));
        assert!(batch.clone().into_urls().is_none());

        batch.complete(1, Ok("b".to_string()));
        assert_eq!(
            batch.into_urls(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_first_failure_is_lowest_position() {
        let mut batch = UploadBatch::new(5);
        batch.complete(4, Err("e4".to_string()));
        batch.complete(1, Err("e1".to_string()));
        assert_eq!(batch.first_failure(), Some((1, "e1")));
    }

    #[test]
    fn test_fresh_batches_are_independent() {
        let mut first = UploadBatch::new(2);
        first.complete(0, Ok("stale".to_string()));
        let second = UploadBatch::new(2);
        assert_ne!(first.id(), second.id());
        assert_eq!(second.progress().completed, 0);
        assert_eq!(second.counts().pending, 2);
    }
}
