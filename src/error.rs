//! Error types for the tasking client

use std::sync::Arc;
use thiserror::Error;

/// Client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request was aborted through its cancellation token
    #[error("Request cancelled")]
    Cancelled,

    /// Failure of a query configured to escalate instead of recovering inline
    #[error("Query {key} failed: {source}")]
    Escalated {
        key: String,
        #[source]
        source: Arc<ClientError>,
    },
}

impl ClientError {
    /// Whether this error only records a cancelled request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Escalated { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
