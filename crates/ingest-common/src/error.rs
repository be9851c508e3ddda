//! Error types for enviro-ingest.

use thiserror::Error;

/// Result type alias using IngestError.
pub type IngestResult<T> = Result<T, IngestError>;

/// Primary error type for data acquisition operations.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Missing credential: set {0} in the environment")]
    MissingCredential(&'static str),

    #[error("HTTP error from {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid AOI geometry: {0}")]
    InvalidAoi(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
