//! Upload content-type checks.

use captionbattle_common::{AppError, AppResult};

/// MIME types the caption pipeline accepts.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
];

/// Check a content type before requesting an upload slot.
///
/// Parameters such as `; charset=...` are ignored and the comparison is
/// case-insensitive.
pub fn validate_upload_content_type(content_type: &str) -> AppResult<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ACCEPTED_CONTENT_TYPES
        .iter()
        .find(|accepted| **accepted == essence)
        .copied()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported file type: {content_type}. Please upload a JPEG, PNG, WebP, GIF or HEIC image."
            ))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_types() {
        for content_type in ACCEPTED_CONTENT_TYPES {
            assert_eq!(validate_upload_content_type(content_type).unwrap(), *content_type);
        }
        assert_eq!(validate_upload_content_type("Image/PNG; q=1").unwrap(), "image/png");
    }

    #[test]
    fn test_rejects_other_types() {
        for content_type in ["image/svg+xml", "application/pdf", "", "video/mp4"] {
            assert!(matches!(
                validate_upload_content_type(content_type),
                Err(AppError::Validation(_))
            ));
        }
    }
}
