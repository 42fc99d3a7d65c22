//! Extraction service wrapper with retry logic, timeouts, and observability.
//!
//! This module provides a generic wrapper around extraction implementations
//! that adds automatic retries for transient failures, configurable timeouts,
//! and optional logging. Permanent failures are returned immediately.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use fisco_core::extract::ExtractService;
//!
//! let extractor = MyOcrBackend::new();
//! let service = ExtractService::new(extractor)
//!     .with_retry_policy(3)
//!     .with_timeout(Duration::from_secs(60))
//!     .with_logging(true);
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::{Error, Extract, Request, Response, Result};
use crate::{ServiceHealth, TRACING_TARGET_EXTRACT};

/// Extraction service wrapper with additional functionality.
///
/// Adds retry logic, timeout handling, and optional logging to any
/// [`Extract`] implementation. The inner service is wrapped in an `Arc`,
/// making this wrapper cheap to clone across worker tasks.
pub struct ExtractService<T> {
    inner: Arc<T>,
    retry_attempts: u32,
    timeout: Duration,
    enable_logging: bool,
    service_name: String,
}

impl<T> Clone for ExtractService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_attempts: self.retry_attempts,
            timeout: self.timeout,
            enable_logging: self.enable_logging,
            service_name: self.service_name.clone(),
        }
    }
}

impl<T> ExtractService<T> {
    /// Creates a new service wrapper with default configuration.
    ///
    /// Default configuration:
    /// - 3 retry attempts
    /// - 60 second timeout
    /// - Logging disabled
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_attempts: 3,
            timeout: Duration::from_secs(60),
            enable_logging: false,
            service_name: "extract-service".to_string(),
        }
    }

    /// Sets the number of attempts for transient failures.
    ///
    /// Only retryable errors (network issues, timeouts, rate limits) are
    /// retried. Permanent errors fail immediately.
    pub fn with_retry_policy(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Sets the timeout duration for a single extraction attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables logging for extraction attempts.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Sets the service name used in logs.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Gets a reference to the inner extraction service.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T> Extract for ExtractService<T>
where
    T: Extract + Send + Sync,
{
    async fn extract(&self, request: Request) -> Result<Response> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            if self.enable_logging {
                tracing::debug!(
                    target: TRACING_TARGET_EXTRACT,
                    service = %self.service_name,
                    job_id = %request.job_id,
                    attempt = attempt,
                    max_attempts = self.retry_attempts,
                    "Running extraction attempt"
                );
            }

            let start = std::time::Instant::now();
            let request_clone = request.clone();

            match tokio::time::timeout(self.timeout, self.inner.extract(request_clone)).await {
                Ok(Ok(response)) => {
                    if self.enable_logging {
                        tracing::debug!(
                            target: TRACING_TARGET_EXTRACT,
                            service = %self.service_name,
                            job_id = %request.job_id,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "Extraction successful"
                        );
                    }
                    return Ok(response);
                }
                Ok(Err(error)) => {
                    if self.enable_logging {
                        tracing::warn!(
                            target: TRACING_TARGET_EXTRACT,
                            service = %self.service_name,
                            job_id = %request.job_id,
                            attempt = attempt,
                            error = %error,
                            "Extraction attempt failed"
                        );
                    }

                    if !error.is_retryable() || attempt == self.retry_attempts {
                        return Err(error);
                    }

                    if let Some(delay) = error.retry_delay() {
                        tokio::time::sleep(delay).await;
                    }

                    last_error = Some(error);
                }
                Err(_) => {
                    let error = Error::timeout();
                    if self.enable_logging {
                        tracing::warn!(
                            target: TRACING_TARGET_EXTRACT,
                            service = %self.service_name,
                            job_id = %request.job_id,
                            attempt = attempt,
                            "Extraction attempt timed out"
                        );
                    }

                    if attempt == self.retry_attempts {
                        return Err(error);
                    }

                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(Error::internal_error))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::extract::ErrorKind;

    /// Extractor that fails a fixed number of times before succeeding.
    struct FlakyExtractor {
        calls: AtomicU32,
        failures: u32,
        kind: fn() -> Error,
    }

    #[async_trait::async_trait]
    impl Extract for FlakyExtractor {
        async fn extract(&self, request: Request) -> Result<Response> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.kind)())
            } else {
                Ok(Response::new(request.request_id, "ok"))
            }
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::healthy())
        }
    }

    fn request() -> Request {
        Request::new(
            uuid::Uuid::now_v7(),
            &b"%PDF"[..],
            "application/pdf",
            "NOTA_FISCAL_EMITIDA",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures() {
        let service = ExtractService::new(FlakyExtractor {
            calls: AtomicU32::new(0),
            failures: 2,
            kind: Error::timeout,
        })
        .with_retry_policy(3);

        let response = service.extract(request()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let service = ExtractService::new(FlakyExtractor {
            calls: AtomicU32::new(0),
            failures: u32::MAX,
            kind: Error::unsupported_format,
        })
        .with_retry_policy(5);

        let error = service.extract(request()).await.unwrap_err();
        assert!(matches!(error.kind, ErrorKind::UnsupportedFormat));
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_ceiling_is_enforced() {
        let service = ExtractService::new(FlakyExtractor {
            calls: AtomicU32::new(0),
            failures: u32::MAX,
            kind: Error::network_error,
        })
        .with_retry_policy(2);

        let error = service.extract(request()).await.unwrap_err();
        assert!(error.is_retryable());
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 2);
    }
}
