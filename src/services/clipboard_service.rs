use crate::error::AppError;

/// Copies the share link to the system clipboard
pub fn copy_to_clipboard(text: &str) -> Result<(), AppError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| AppError::ClipboardUnavailable(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| AppError::ClipboardUnavailable(e.to_string()))?;
    log::debug!("Copied {} characters to the clipboard", text.len());
    Ok(())
}
