//! Error types for billing ledger calls.

use thiserror::Error;

/// Result type alias for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Error type for billing ledger operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The ledger answered with an unexpected status code.
    #[error("Unexpected ledger response: HTTP {status}")]
    UnexpectedStatus {
        /// Status code the ledger returned.
        status: u16,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BillingError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns `true` if retrying the charge may succeed.
    ///
    /// Safe to retry because the ledger deduplicates on the idempotency
    /// key, so a charge that actually landed is not repeated.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::UnexpectedStatus { status } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            Self::Serde(_) | Self::InvalidConfig(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(BillingError::UnexpectedStatus { status: 500 }.is_retryable());
        assert!(BillingError::UnexpectedStatus { status: 503 }.is_retryable());
        assert!(BillingError::UnexpectedStatus { status: 429 }.is_retryable());
        assert!(!BillingError::UnexpectedStatus { status: 400 }.is_retryable());
        assert!(!BillingError::UnexpectedStatus { status: 404 }.is_retryable());
        assert!(!BillingError::invalid_config("missing url").is_retryable());
    }
}
