//! Multipart form parsing helpers

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{parse_optional, validate_content_type, validate_file_size};

/// Field names accepted for the query image.
const FILE_FIELDS: &[&str] = &["file", "image"];

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug)]
pub struct MultipartFields {
    file: Option<FileField>,
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request, validating the image's
    /// Content-Type and size as it is read.
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut file: Option<FileField> = None;
        let mut text_fields = HashMap::new();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if FILE_FIELDS.contains(&name.as_str()) {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());
                validate_content_type(content_type.as_deref())?;

                // Read chunk by chunk so an oversized upload is refused at the limit
                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                {
                    let received = data.len() + chunk.len();
                    if received > max_file_size {
                        validate_file_size(received, max_file_size)?;
                    }
                    data.extend_from_slice(&chunk);
                }
                validate_file_size(data.len(), max_file_size)?;

                file = Some(FileField {
                    data,
                    content_type,
                    file_name,
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                text_fields.insert(name, value);
            }
        }

        Ok(Self { file, text_fields })
    }

    /// Take the uploaded image; an error if none was sent.
    pub fn take_file(&mut self) -> Result<FileField, ApiError> {
        self.file.take().ok_or_else(|| {
            ApiError::bad_request("No image provided. Use the 'file' field in the multipart form.")
        })
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// A text field parsed as `T`; `None` when absent or empty.
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        parse_optional(name, self.get_text(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> MultipartFields {
        MultipartFields {
            file: None,
            text_fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_get_text() {
        let fields = fields(&[("preset", "permissive")]);
        assert_eq!(fields.get_text("preset"), Some("permissive"));
        assert_eq!(fields.get_text("missing"), None);
    }

    #[test]
    fn test_get_parsed() {
        let fields = fields(&[("limit", "5"), ("threshold", "abc")]);
        assert_eq!(fields.get_parsed::<usize>("limit").unwrap(), Some(5));
        assert_eq!(fields.get_parsed::<usize>("missing").unwrap(), None);
        assert!(fields.get_parsed::<u32>("threshold").is_err());
    }

    #[test]
    fn test_take_file_missing() {
        let mut fields = fields(&[]);
        assert!(fields.take_file().is_err());
    }
}
