//! Input checks that run before any external call.

use crate::error::AppError;

/// Image types the recognizers accept, lower-case.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
];

pub const MIN_TEXT_CHARS: usize = 10;

pub fn is_allowed_mime(mime_type: &str) -> bool {
    let lower = mime_type.trim().to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&lower.as_str())
}

pub fn validate_mime(mime_type: &str) -> Result<(), AppError> {
    if is_allowed_mime(mime_type) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unsupported image format: {}. Please use JPEG, PNG, GIF, BMP, WebP, or TIFF.",
            mime_type
        )))
    }
}

pub fn validate_size(len: usize, max_upload_mb: usize) -> Result<(), AppError> {
    if len > max_upload_mb * 1024 * 1024 {
        Err(AppError::UploadLimit(max_upload_mb))
    } else {
        Ok(())
    }
}

/// Text for `/process-text` must have at least ten characters once trimmed.
pub fn validate_text(text: Option<&str>) -> Result<&str, AppError> {
    match text {
        Some(t) if t.trim().chars().count() >= MIN_TEXT_CHARS => Ok(t),
        _ => Err(AppError::Validation("Text is too short or empty".to_string())),
    }
}
