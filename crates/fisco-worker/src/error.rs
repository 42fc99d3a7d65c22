//! Error types for the worker loop.

use thiserror::Error;

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Error type for worker operations.
///
/// Processing outcomes never surface through this type; they land on the
/// job row. `WorkerError` only covers infrastructure failures around the
/// loop itself.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Job store operation failed.
    #[error("Job store error: {0}")]
    Store(#[from] fisco_postgres::PgError),

    /// Blob storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] fisco_opendal::StorageError),

    /// Queue operation failed.
    #[error("Queue error: {0}")]
    Queue(#[from] fisco_nats::Error),

    /// Billing ledger call failed.
    #[error("Billing error: {0}")]
    Billing(#[from] fisco_billing::BillingError),
}

impl WorkerError {
    /// Returns `true` when the failed operation may succeed on retry.
    ///
    /// Transient errors leave the message unacknowledged or negatively
    /// acknowledged, so the queue redelivers it later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Storage(e) => e.is_transient(),
            Self::Queue(e) => e.is_retryable(),
            Self::Billing(e) => e.is_retryable(),
        }
    }
}
