//! Mock extraction implementation for testing.
//!
//! Returns canned structured data and can be scripted to fail a number of
//! times with a transient error, or to always fail permanently, which is how
//! the worker's retry and terminal-failure paths are exercised in tests.
//!
//! Only available with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! fisco-core = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use crate::extract::{Error, Extract, Request, Response, Result};
use crate::{ServiceHealth, ServiceStatus};

/// Failure behavior for the mock extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockFailure {
    /// Every call succeeds.
    #[default]
    None,
    /// The first N calls fail with a transient error, then calls succeed.
    TransientTimes(u32),
    /// Every call fails with a permanent error.
    Permanent,
}

/// Scriptable extraction backend for tests.
#[derive(Debug)]
pub struct MockExtractor {
    text: String,
    fields: serde_json::Value,
    failure: MockFailure,
    calls: AtomicU32,
    healthy: bool,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self {
            text: "Mock extracted text".to_string(),
            fields: serde_json::json!({"valor_total": 100.0}),
            failure: MockFailure::None,
            calls: AtomicU32::new(0),
            healthy: true,
        }
    }
}

impl MockExtractor {
    /// Creates a mock that always succeeds with the given payload.
    pub fn succeeding(text: impl Into<String>, fields: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            fields,
            ..Default::default()
        }
    }

    /// Sets the failure behavior.
    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failure = failure;
        self
    }

    /// Marks the backend as unhealthy for health checks.
    pub fn with_unhealthy_backend(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Number of extraction calls observed so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Extract for MockExtractor {
    async fn extract(&self, request: Request) -> Result<Response> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.failure {
            MockFailure::None => {}
            MockFailure::TransientTimes(n) if call < n => {
                return Err(Error::service_unavailable());
            }
            MockFailure::TransientTimes(_) => {}
            MockFailure::Permanent => return Err(Error::extraction_failed()),
        }

        Ok(Response::new(request.request_id, self.text.clone())
            .with_fields(self.fields.clone())
            .with_confidence(0.99))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        if self.healthy {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth {
                status: ServiceStatus::Unhealthy,
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(
            uuid::Uuid::now_v7(),
            &b"fake"[..],
            "image/png",
            "INFORME_BANCARIO",
        )
    }

    #[tokio::test]
    async fn succeeds_by_default() {
        let mock = MockExtractor::default();
        let response = mock.extract(request()).await.unwrap();
        assert!(response.has_text());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn transient_failures_then_success() {
        let mock = MockExtractor::default().with_failure(MockFailure::TransientTimes(2));

        assert!(mock.extract(request()).await.unwrap_err().is_retryable());
        assert!(mock.extract(request()).await.unwrap_err().is_retryable());
        assert!(mock.extract(request()).await.is_ok());
    }

    #[tokio::test]
    async fn permanent_failure() {
        let mock = MockExtractor::default().with_failure(MockFailure::Permanent);
        let error = mock.extract(request()).await.unwrap_err();
        assert!(error.is_permanent());
    }
}
