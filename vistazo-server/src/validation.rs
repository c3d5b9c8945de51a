//! Upload validation module
//!
//! Provides validation utilities for query images and form values.

use std::str::FromStr;

use vistazo_core::imaging;

use crate::error::ApiError;

/// Allowed MIME type prefixes for query images
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Default max file size in bytes (10 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Validates the Content-Type of an uploaded file
///
/// Accepts `image/*` and `application/octet-stream`. A missing Content-Type
/// is treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file is empty or exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Empty image upload"));
    }
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Rejects bytes whose format the decoder does not recognize, before any
/// blocking work is scheduled.
pub fn validate_image_format(bytes: &[u8]) -> Result<(), ApiError> {
    if imaging::is_supported_format(bytes) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Unsupported image format. Allowed: JPEG, PNG, GIF, WebP, BMP, TIFF",
        ))
    }
}

/// Parse an optional form or query value, naming the field on failure.
pub fn parse_optional<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid '{}' value: '{}'", name, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_type_image() {
        assert!(validate_content_type(Some("image/jpeg")).is_ok());
        assert!(validate_content_type(Some("image/png")).is_ok());
        assert!(validate_content_type(Some("image/webp")).is_ok());
        assert!(validate_content_type(Some("IMAGE/JPEG")).is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_content_type_binary_and_none() {
        assert!(validate_content_type(Some("application/octet-stream")).is_ok());
        assert!(validate_content_type(None).is_ok());
    }

    #[test]
    fn test_validate_content_type_rejected() {
        assert!(validate_content_type(Some("video/mp4")).is_err());
        assert!(validate_content_type(Some("text/html")).is_err());
        assert!(validate_content_type(Some("application/json")).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let max = 10 * 1024 * 1024; // 10 MB
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok()); // exactly max
        assert!(validate_file_size(max + 1, max).is_err());
        assert!(validate_file_size(0, max).is_err());
    }

    #[test]
    fn test_validate_image_format() {
        // PNG signature
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(validate_image_format(&png).is_ok());
        assert!(validate_image_format(b"<html></html>").is_err());
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional::<u32>("limit", Some("5")).unwrap(), Some(5));
        assert_eq!(parse_optional::<u32>("limit", Some(" 7 ")).unwrap(), Some(7));
        assert_eq!(parse_optional::<u32>("limit", Some("")).unwrap(), None);
        assert_eq!(parse_optional::<u32>("limit", None).unwrap(), None);
        assert!(parse_optional::<u32>("limit", Some("ten")).is_err());
    }
}
