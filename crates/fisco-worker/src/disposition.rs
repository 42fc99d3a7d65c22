//! Failure classification for extraction outcomes.
//!
//! After the in-process retry budget is spent, the worker has to decide
//! between asking the queue for a later redelivery and settling the job as
//! permanently failed. The decision is pure so it can be tested without a
//! queue or a database.

use std::time::Duration;

use fisco_core::extract::Error as ExtractError;

use crate::WorkerError;

/// What to do with a delivery whose extraction did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Negatively acknowledge; the queue redelivers after the delay.
    Retry(Duration),
    /// Settle the job as `failed` with this message, then acknowledge.
    Fail(String),
}

/// Classifies an extraction failure for a given delivery attempt.
///
/// Permanent errors fail immediately. Transient errors are retried via
/// queue redelivery until `max_deliver` attempts are spent, with a bounded
/// exponential delay; after that the retry budget is exhausted and the job
/// fails.
pub fn classify_failure(
    error: &ExtractError,
    delivery_attempt: i64,
    max_deliver: i64,
    base: Duration,
    max: Duration,
) -> FailureDisposition {
    if error.is_retryable() && delivery_attempt < max_deliver {
        FailureDisposition::Retry(retry_backoff(delivery_attempt, base, max))
    } else {
        FailureDisposition::Fail(error.to_string())
    }
}

/// Classifies an infrastructure failure for a given delivery attempt.
///
/// These errors surface with the job row not yet settled, so the message
/// must stay alive while redelivery budget remains: transient errors back
/// off exponentially, anything else waits the full cap. On the final
/// delivery a nak would consume the last redelivery and strand the row in
/// `processing`, so the job has to settle as `failed` instead.
pub fn classify_infra_failure(
    error: &WorkerError,
    delivery_attempt: i64,
    max_deliver: i64,
    base: Duration,
    max: Duration,
) -> FailureDisposition {
    if delivery_attempt < max_deliver {
        let delay = if error.is_transient() {
            retry_backoff(delivery_attempt, base, max)
        } else {
            max
        };
        FailureDisposition::Retry(delay)
    } else {
        FailureDisposition::Fail(format!("Processing failed on final delivery: {error}"))
    }
}

/// Bounded exponential backoff: `base * 2^(attempt-1)`, capped at `max`.
pub fn retry_backoff(delivery_attempt: i64, base: Duration, max: Duration) -> Duration {
    let exponent = delivery_attempt.clamp(1, 32) as u32 - 1;
    base.saturating_mul(2u32.saturating_pow(exponent)).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(5);
    const MAX: Duration = Duration::from_secs(120);

    #[test]
    fn permanent_errors_fail_on_first_attempt() {
        let disposition = classify_failure(&ExtractError::unsupported_format(), 1, 5, BASE, MAX);
        assert!(matches!(disposition, FailureDisposition::Fail(_)));
    }

    #[test]
    fn transient_errors_retry_with_growing_delay() {
        let first = classify_failure(&ExtractError::service_unavailable(), 1, 5, BASE, MAX);
        let third = classify_failure(&ExtractError::service_unavailable(), 3, 5, BASE, MAX);

        assert_eq!(first, FailureDisposition::Retry(Duration::from_secs(5)));
        assert_eq!(third, FailureDisposition::Retry(Duration::from_secs(20)));
    }

    #[test]
    fn exhausted_budget_fails_even_when_transient() {
        let disposition = classify_failure(&ExtractError::timeout(), 5, 5, BASE, MAX);
        assert!(matches!(disposition, FailureDisposition::Fail(_)));
    }

    #[test]
    fn infra_failures_retry_while_budget_remains() {
        let transient = WorkerError::Storage(fisco_opendal::StorageError::read("connection reset"));
        let disposition = classify_infra_failure(&transient, 2, 5, BASE, MAX);
        assert_eq!(disposition, FailureDisposition::Retry(Duration::from_secs(10)));

        let permanent = WorkerError::Storage(fisco_opendal::StorageError::not_found("gone"));
        let disposition = classify_infra_failure(&permanent, 2, 5, BASE, MAX);
        assert_eq!(disposition, FailureDisposition::Retry(MAX));
    }

    #[test]
    fn infra_failure_on_final_delivery_settles_the_job() {
        // A nak here would be the last one the queue honors; the job must
        // reach a terminal state instead of sitting in `processing`.
        let transient = WorkerError::Storage(fisco_opendal::StorageError::read("connection reset"));
        let disposition = classify_infra_failure(&transient, 5, 5, BASE, MAX);
        assert!(matches!(disposition, FailureDisposition::Fail(_)));

        let queue_down =
            WorkerError::Queue(fisco_nats::Error::timeout(std::time::Duration::from_secs(5)));
        let disposition = classify_infra_failure(&queue_down, 6, 5, BASE, MAX);
        assert!(matches!(disposition, FailureDisposition::Fail(_)));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_backoff(1, BASE, MAX), Duration::from_secs(5));
        assert_eq!(retry_backoff(4, BASE, MAX), Duration::from_secs(40));
        assert_eq!(retry_backoff(10, BASE, MAX), MAX);
        assert_eq!(retry_backoff(0, BASE, MAX), Duration::from_secs(5));
    }
}
