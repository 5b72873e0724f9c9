//! Error types for hrm
//!
//! Every handler failure funnels through `HrmError`, which maps to exactly one
//! HTTP status. Server-side failures are logged in full and answered with a
//! generic message so driver or filesystem details never reach the caller.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::error;

/// Main error type for hrm operations
#[derive(Debug, thiserror::Error)]
pub enum HrmError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HrmError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::PayloadTooLarge(_) => "Request body too large".to_string(),
            Self::Database(_) => "Database unavailable".to_string(),
            Self::Storage(_) | Self::Internal(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }
        let body = serde_json::json!({ "error": self.public_message() });
        (status, body.to_string())
    }

    /// Convert to a JSON error response
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let (status, body) = self.into_status_code_and_body();
        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{}"))))
    }
}

impl From<std::io::Error> for HrmError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for HrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for HrmError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for HrmError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for HrmError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encode failed: {}", err))
    }
}

impl From<bson::de::Error> for HrmError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("BSON decode failed: {}", err))
    }
}

impl From<multer::Error> for HrmError {
    fn from(err: multer::Error) -> Self {
        Self::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

/// Result type alias for hrm operations
pub type Result<T> = std::result::Result<T, HrmError>;
