//! Error types for the OData response reader.

use thiserror::Error;

/// Result type alias using the reader's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Faults raised while reading a response.
///
/// Remote error payloads are not represented here: an error-kind response
/// is read successfully into a status-code envelope and the caller decides
/// how to surface it.
#[derive(Debug, Error)]
pub enum Error {
    /// Stream read or tokenizer fault, passed through unchanged
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Payload kind combination with no defined handling
    #[error("Unsupported payload: {0}")]
    UnsupportedPayload(String),

    /// Start/End events that do not nest
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A message quota was exceeded
    #[error("Message quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Global subscriber could not be installed
    #[error("Tracing initialisation failed: {0}")]
    Tracing(String),
}
