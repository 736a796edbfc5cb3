//! Error types for markitdown-api.
//!
//! Two distinct error types reflect two distinct sides of a request:
//!
//! * [`ConversionError`]: the conversion backend (or the worker pool that
//!   runs it) could not turn the uploaded bytes into Markdown. The detail is
//!   kept for the server log only.
//!
//! * [`ApiError`]: what the HTTP layer reports to the client. Validation
//!   failures carry a human-readable reason; everything else collapses into a
//!   generic 500 body so backend internals never reach the client.
//!
//! [`ConfigError`] covers startup-time configuration validation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Body returned for every 500 response.
pub const GENERIC_SERVER_ERROR: &str = "Internal server error occurred";

/// Failure of a single conversion job. Never retried.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Neither the extension nor the leading bytes identify a known format.
    #[error("Unsupported document format for '{filename}'")]
    UnsupportedFormat { filename: String },

    /// The container or markup could not be parsed.
    #[error("Malformed {format} document '{filename}': {detail}")]
    Malformed {
        filename: String,
        format: &'static str,
        detail: String,
    },

    /// Opaque failure raised by a backend implementation.
    #[error("Conversion backend failed for '{filename}': {detail}")]
    Backend { filename: String, detail: String },

    /// The backend panicked while the job was running on a worker.
    #[error("Conversion worker panicked while converting '{filename}': {detail}")]
    WorkerPanicked { filename: String, detail: String },

    /// The job was dropped without a reply.
    #[error("Conversion pool is shut down")]
    PoolClosed,
}

impl ConversionError {
    /// Shorthand for [`ConversionError::Backend`].
    pub fn backend(filename: impl Into<String>, detail: impl ToString) -> Self {
        ConversionError::Backend {
            filename: filename.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for [`ConversionError::Malformed`].
    pub fn malformed(filename: impl Into<String>, format: &'static str, detail: impl ToString) -> Self {
        ConversionError::Malformed {
            filename: filename.into(),
            format,
            detail: detail.to_string(),
        }
    }
}

/// Invalid [`crate::config::ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upload was rejected before any conversion work began.
    #[error("{message}")]
    BadRequest {
        message: String,
        /// Name of the rejected upload, when the request carried one.
        filename: Option<String>,
    },

    /// The conversion backend failed for an accepted upload.
    #[error("Error converting file {filename}: {source}")]
    Conversion {
        filename: String,
        #[source]
        source: ConversionError,
    },
}

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            filename: None,
        }
    }

    /// A 400 for a named upload; the filename goes to the log, not the body.
    pub fn rejected(filename: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            filename: Some(filename.into()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conversion { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe message, without leaking internal details.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message, .. } => message.clone(),
            ApiError::Conversion { .. } => GENERIC_SERVER_ERROR.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Conversion { filename, source } => {
                tracing::error!(filename = %filename, error = %source, "Error converting file");
            }
            ApiError::BadRequest {
                message,
                filename: Some(filename),
            } => {
                tracing::warn!(filename = %filename, reason = %message, "Rejected upload");
            }
            ApiError::BadRequest { message, filename: None } => {
                tracing::warn!(reason = %message, "Rejected request");
            }
        }

        let body = ErrorBody {
            detail: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_is_generic_to_clients() {
        let e = ApiError::Conversion {
            filename: "report.pdf".into(),
            source: ConversionError::backend("report.pdf", "xref table corrupt at 0x3f"),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.user_message(), GENERIC_SERVER_ERROR);
        // The Display form keeps the cause for logging.
        assert!(e.to_string().contains("xref table corrupt"));
        assert!(e.to_string().contains("report.pdf"));
    }

    #[test]
    fn bad_request_echoes_reason() {
        let e = ApiError::bad_request("Empty file provided");
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.user_message(), "Empty file provided");
    }

    #[test]
    fn rejected_upload_keeps_filename_out_of_body() {
        let e = ApiError::rejected("notes.txt", "Invalid file type. Expected: pdf");
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.user_message(), "Invalid file type. Expected: pdf");
        match e {
            ApiError::BadRequest { filename, .. } => assert_eq!(filename.as_deref(), Some("notes.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pool_closed_is_generic_to_clients() {
        let e = ApiError::Conversion {
            filename: "a.pdf".into(),
            source: ConversionError::PoolClosed,
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.user_message(), GENERIC_SERVER_ERROR);
    }

    #[test]
    fn malformed_display() {
        let e = ConversionError::malformed("deck.pptx", "PPTX", "missing ppt/presentation.xml");
        let msg = e.to_string();
        assert!(msg.contains("PPTX"), "got: {msg}");
        assert!(msg.contains("deck.pptx"), "got: {msg}");
    }
}
