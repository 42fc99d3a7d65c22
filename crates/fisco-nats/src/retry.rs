//! Bounded retry for queue operations.
//!
//! The gateway publishes a job message right after committing the job row;
//! a short broker hiccup at that moment should not surface to the caller.
//! `RetryConfig` wraps such operations in a small exponential-backoff loop.

use std::time::Duration;

use crate::{Error, Result};

/// Exponential backoff policy for a retried operation.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 means the operation runs once)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Ceiling on the delay between retries
    pub max_backoff: Duration,
    /// Growth factor applied per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Creates a policy with the given attempt budget and initial delay.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a policy that runs the operation exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the ceiling on the delay between retries.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Sets the growth factor applied per retry.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_millis = (self.initial_backoff.as_millis() as f64)
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_millis as u64);
        backoff.min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Non-retryable errors (serialization, configuration) abort
    /// immediately; only transport-level failures are worth repeating.
    ///
    /// # Example
    /// ```ignore
    /// let config = RetryConfig::default();
    /// config.retry(|| queue.publish(&message)).await?;
    /// ```
    pub async fn retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() {
                        tracing::debug!(
                            target: crate::TRACING_TARGET_CONNECTION,
                            error = %err,
                            "Non-retryable error, failing immediately"
                        );
                        return Err(err);
                    }

                    last_error = Some(err);

                    if attempt < self.max_attempts {
                        let backoff = self.calculate_backoff(attempt);
                        tracing::debug!(
                            target: crate::TRACING_TARGET_CONNECTION,
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            backoff_ms = backoff.as_millis(),
                            "Retrying operation after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::operation("retry", "All retry attempts exhausted with no error")
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        let config = RetryConfig::default().with_max_backoff(Duration::from_millis(300));

        assert_eq!(config.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(config.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(config.calculate_backoff(2), Duration::from_millis(300));
        assert_eq!(config.calculate_backoff(5), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn publish_survives_a_short_broker_outage() {
        let config = RetryConfig::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        // First two publishes find no responders, the third lands.
        let result = config
            .retry(|| {
                let attempts = seen.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::delivery_failed("fisco.ocr.jobs", "no responders"))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_the_last_transport_error() {
        let config = RetryConfig::new(2, Duration::from_millis(10));
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        let result: Result<()> = config
            .retry(|| {
                let attempts = seen.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(Error::timeout(Duration::from_secs(1)))
                }
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn bad_envelope_is_not_republished() {
        let config = RetryConfig::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        let result: Result<()> = config
            .retry(|| {
                let attempts = seen.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Serialization(serde_json::Error::io(
                        std::io::Error::other("truncated"),
                    )))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_retry_runs_the_operation_once() {
        let config = RetryConfig::no_retry();
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        let result: Result<()> = config
            .retry(|| {
                let attempts = seen.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(Error::timeout(Duration::from_secs(1)))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
