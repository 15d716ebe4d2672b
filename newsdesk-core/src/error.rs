//! Error types for the newsdesk pipeline

use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum DeskError {
    /// Timeout, 5xx, or throttling after the retry ceiling
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Provider budget exhausted after bounded backoff
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Payload missing required fields; the item is dropped, not retried
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Persistence sink unavailable; logged, never fatal to aggregation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Missing credentials or budget configuration; fatal at construction
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeskError {
    pub fn transient(msg: impl Into<String>) -> Self {
        DeskError::Transient(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        DeskError::MalformedPayload(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        DeskError::Persistence(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DeskError::Config(msg.into())
    }
}

/// Result type alias for pipeline operations
pub type DeskResult<T> = Result<T, DeskError>;
