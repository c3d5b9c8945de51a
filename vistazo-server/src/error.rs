//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use vistazo_core::VistazoError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request timeout - operation took too long
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Error from the search library
    #[error("{0}")]
    Vistazo(#[from] VistazoError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Vistazo(ref e) => match e {
                // Client-provided invalid input → 400
                VistazoError::DecodeError(_)
                | VistazoError::InvalidFingerprint(_)
                | VistazoError::InvalidColor(_)
                | VistazoError::InvalidConfig(_)
                | VistazoError::EmbeddingShape(_)
                | VistazoError::InvalidFeatureVector { .. } => StatusCode::BAD_REQUEST,

                // Index not built, or the vector service is down → 503
                VistazoError::IndexMissing { .. }
                | VistazoError::VectorSearchError(_)
                | VistazoError::HttpError(_) => StatusCode::SERVICE_UNAVAILABLE,

                VistazoError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,

                // Internal processing failures → 500
                VistazoError::InvalidIndex(_)
                | VistazoError::SerializationError(_)
                | VistazoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Vistazo(ref e) => match e {
                VistazoError::DecodeError(_) => "INVALID_IMAGE",
                VistazoError::InvalidFingerprint(_) => "INVALID_FINGERPRINT",
                VistazoError::InvalidColor(_) => "INVALID_COLOR",
                VistazoError::InvalidConfig(_) => "INVALID_INPUT",
                VistazoError::EmbeddingShape(_) => "INVALID_EMBEDDING",
                VistazoError::InvalidFeatureVector { .. } => "INVALID_DIMENSIONS",
                VistazoError::IndexMissing { .. } => "INDEX_MISSING",
                VistazoError::VectorSearchError(_) => "VECTOR_SEARCH_UNAVAILABLE",
                VistazoError::HttpError(_) => "UPSTREAM_ERROR",
                VistazoError::Timeout(_) => "TIMEOUT",
                VistazoError::InvalidIndex(_) => "INVALID_INDEX",
                VistazoError::SerializationError(_) => "SERIALIZATION_ERROR",
                VistazoError::Io(_) => "IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Vistazo(ref e) => match e {
                VistazoError::IndexMissing { .. } => {
                    "Search index is not available; rebuild the index".to_string()
                }
                VistazoError::VectorSearchError(_) => "Vector search unavailable".to_string(),
                VistazoError::HttpError(_) => "Upstream service error".to_string(),
                VistazoError::InvalidIndex(_)
                | VistazoError::SerializationError(_)
                | VistazoError::Io(_) => "Internal error".to_string(),
                // Input errors are safe to echo back
                other => other.to_string(),
            },
            Self::Internal(_) => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            tracing::error!(
                status = %status,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
