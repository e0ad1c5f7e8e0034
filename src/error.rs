//! Error types for Wicket
//!
//! One taxonomy shared across modules. Each variant carries enough context
//! for the response layer to pick a status code and a stable failure-kind
//! tag without inspecting error strings.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WicketError {
    /// The request itself is unusable (missing or malformed parts).
    #[error("invalid upload request: {0}")]
    Validation(String),

    /// Upload exceeded the configured size cap.
    #[error("upload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// The storage node could not be reached (connect failure or timeout).
    #[error("storage node unreachable: {0}")]
    StorageUnavailable(String),

    /// The storage node was reached but the add did not succeed.
    #[error("storage add failed: {0}")]
    StorageAddFailed(String),

    /// A structured value could not be encoded for submission.
    #[error("metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Startup configuration problem. Never surfaced per-request.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WicketError {
    /// HTTP status this error maps to at the response boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            WicketError::Validation(_) => StatusCode::BAD_REQUEST,
            WicketError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            WicketError::StorageUnavailable(_)
            | WicketError::StorageAddFailed(_)
            | WicketError::Serialization(_) => StatusCode::BAD_GATEWAY,
            WicketError::Config(_) | WicketError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable failure-kind tag included in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WicketError::Validation(_) => "validation",
            WicketError::PayloadTooLarge { .. } => "payload_too_large",
            WicketError::StorageUnavailable(_) => "storage_unavailable",
            WicketError::StorageAddFailed(_) => "storage_add_failed",
            WicketError::Serialization(_) => "serialization",
            WicketError::Config(_) => "config",
            WicketError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, WicketError>;
