//! Error types for the submission gateway.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The submission failed validation before any side effect.
    #[error("Invalid submission: {0}")]
    Validation(String),

    /// Writing the uploaded file to blob storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] fisco_opendal::StorageError),

    /// Recording or reading the job row failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] fisco_postgres::PgError),

    /// Publishing the job reference to the queue failed.
    ///
    /// The job row exists in `pending` state; the reconciliation sweep
    /// re-publishes it, so the job is delayed rather than lost.
    #[error("Queue publish error: {0}")]
    QueuePublish(#[from] fisco_nats::Error),

    /// No job exists with the requested ID.
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    /// The requester does not own the job.
    #[error("Access to job denied")]
    Forbidden,
}

impl GatewayError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_leaks_no_job_details() {
        let message = GatewayError::Forbidden.to_string();
        assert!(!message.contains("account"));
        assert!(!message.contains("-"));
    }
}
