//! Error types for provider transports and normalization

use thiserror::Error;

use newsdesk_core::DeskError;

/// Errors that can occur while fetching from a provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Provider returned an error response
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the provider
        message: String,
    },

    /// Failed to parse the provider response body
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Provider throttled the request, or the budget was exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider call timed out
    #[error("Request timed out")]
    Timeout,

    /// Missing credentials or unknown provider
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Whether a retry with backoff is warranted
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::RateLimited | FetchError::Timeout | FetchError::RequestFailed(_) => true,
            FetchError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<FetchError> for DeskError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::RateLimited => DeskError::RateLimited,
            FetchError::InvalidConfig(msg) => DeskError::Config(msg),
            FetchError::ParseError(msg) => DeskError::MalformedPayload(msg),
            other => DeskError::Transient(other.to_string()),
        }
    }
}

/// Errors that can occur while normalizing a provider payload
///
/// These drop the offending item only; they never abort the batch.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A required field was missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Item failed the quality filter
    #[error("Quality filter rejected item: {0}")]
    QualityRejected(String),

    /// Publication timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Payload did not match the provider's wire shape
    #[error("Unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

impl From<NormalizeError> for DeskError {
    fn from(e: NormalizeError) -> Self {
        DeskError::MalformedPayload(e.to_string())
    }
}
