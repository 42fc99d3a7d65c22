//! Error handling for extraction operations.
//!
//! Errors are split into two families the worker cares about:
//!
//! - **Transient** (network problems, timeouts, rate limits, overloaded
//!   backends): retried with backoff up to the worker's attempt ceiling.
//! - **Permanent** (invalid input, unsupported formats, parsing failures):
//!   recorded immediately as the job's terminal failure.

use std::error::Error as StdError;
use std::time::Duration;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for extraction operations.
///
/// Carries the specific error kind plus an optional source error for
/// debugging. The kind alone decides the retry policy.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The specific kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error for additional context.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Creates a new error with the given kind and source error.
    pub fn with_source(kind: ErrorKind, source: Box<dyn StdError + Send + Sync>) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format() -> Self {
        Self::new(ErrorKind::UnsupportedFormat)
    }

    /// Creates a document too large error.
    pub fn document_too_large() -> Self {
        Self::new(ErrorKind::DocumentTooLarge)
    }

    /// Creates a no text detected error.
    pub fn no_text_detected() -> Self {
        Self::new(ErrorKind::NoTextDetected)
    }

    /// Creates an extraction failed error.
    pub fn extraction_failed() -> Self {
        Self::new(ErrorKind::ExtractionFailed)
    }

    /// Creates a timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable() -> Self {
        Self::new(ErrorKind::ServiceUnavailable)
    }

    /// Creates an internal error.
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Returns true if the operation should be retried.
    ///
    /// Retryable errors are transient issues like network problems, rate
    /// limits, or temporary backend unavailability.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimited
                | ErrorKind::NetworkError
                | ErrorKind::Timeout
                | ErrorKind::ServiceUnavailable
        )
    }

    /// Returns true if the failure is permanent and must not be retried.
    ///
    /// Permanent failures become the job's terminal error description.
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }

    /// Returns the suggested retry delay for retryable errors.
    ///
    /// Returns `None` for non-retryable errors.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self.kind {
            ErrorKind::RateLimited => Some(Duration::from_secs(60)),
            ErrorKind::ServiceUnavailable => Some(Duration::from_secs(10)),
            ErrorKind::NetworkError => Some(Duration::from_secs(5)),
            ErrorKind::Timeout => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Specific kinds of extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The input provided to the extraction service is invalid.
    #[error("Invalid input provided")]
    InvalidInput,

    /// The document format is not supported by the extraction service.
    #[error("Unsupported document format")]
    UnsupportedFormat,

    /// The document exceeds the maximum size limit.
    #[error("Document is too large")]
    DocumentTooLarge,

    /// No readable text was detected in the document.
    #[error("No text detected in document")]
    NoTextDetected,

    /// The extraction process itself failed.
    #[error("Data extraction failed")]
    ExtractionFailed,

    /// The operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// A network error occurred while talking to the backend.
    #[error("Network error")]
    NetworkError,

    /// The backend rate-limited the request.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The backend is temporarily unavailable.
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    /// An unexpected internal error occurred.
    #[error("Internal service error")]
    InternalError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(Error::timeout().is_retryable());
        assert!(Error::network_error().is_retryable());
        assert!(Error::rate_limited().is_retryable());
        assert!(Error::service_unavailable().is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(Error::invalid_input().is_permanent());
        assert!(Error::unsupported_format().is_permanent());
        assert!(Error::extraction_failed().is_permanent());
        assert!(Error::no_text_detected().is_permanent());
        assert!(Error::internal_error().is_permanent());
    }

    #[test]
    fn retry_delay_only_for_retryable() {
        assert!(Error::rate_limited().retry_delay().is_some());
        assert!(Error::invalid_input().retry_delay().is_none());
    }
}
