//! Reqwest-based HTTP client for the billing ledger.

use std::sync::Arc;

use reqwest::{Client, StatusCode};

use crate::{
    BillingConfig, BillingError, BillingProvider, ChargeOutcome, ChargeReceipt, ChargeRequest,
    Result, ServiceHealth, TRACING_TARGET,
};

/// Inner client that holds the HTTP client and configuration.
struct HttpBillingClientInner {
    http: Client,
    config: BillingConfig,
}

/// Reqwest-based billing ledger client.
///
/// Every charge carries an `Idempotency-Key` header set to the job ID. The
/// ledger replays the original response for a repeated key, so worker
/// retries and queue redeliveries settle to exactly one ledger entry per
/// job.
#[derive(Clone)]
pub struct HttpBillingClient {
    inner: Arc<HttpBillingClientInner>,
}

impl std::fmt::Debug for HttpBillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBillingClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpBillingClient {
    /// Creates a new billing client with the given configuration.
    pub fn new(config: BillingConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            charges_url = %config.charges_url(),
            timeout_ms = config.timeout().as_millis(),
            "Creating billing client"
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("fisco/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBillingClientInner { http, config }),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &BillingConfig {
        &self.inner.config
    }
}

#[async_trait::async_trait]
impl BillingProvider for HttpBillingClient {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        tracing::debug!(
            target: TRACING_TARGET,
            job_id = %request.job_id,
            account_id = %request.account_id,
            amount_cents = request.amount_cents,
            "Charging account"
        );

        let mut http_request = self
            .inner
            .http
            .post(self.inner.config.charges_url())
            .header("Idempotency-Key", request.idempotency_key())
            .json(request);

        if let Some(ref token) = self.inner.config.billing_api_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request.send().await?;
        let status = response.status();

        match status {
            // 2xx is a fresh charge; 409 is the ledger replaying a key it
            // has already settled. Both carry the receipt.
            s if s.is_success() || s == StatusCode::CONFLICT => {
                let body = response.bytes().await?;
                let receipt: ChargeReceipt = serde_json::from_slice(&body)?;

                tracing::info!(
                    target: TRACING_TARGET,
                    job_id = %request.job_id,
                    receipt_id = %receipt.receipt_id,
                    replayed = (s == StatusCode::CONFLICT),
                    "Charge accepted"
                );
                Ok(ChargeOutcome::Charged(receipt))
            }
            StatusCode::PAYMENT_REQUIRED => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    job_id = %request.job_id,
                    account_id = %request.account_id,
                    "Charge declined: insufficient funds"
                );
                Ok(ChargeOutcome::InsufficientFunds)
            }
            s => Err(BillingError::UnexpectedStatus {
                status: s.as_u16(),
            }),
        }
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        // The client is stateless and healthy if it was created successfully
        Ok(ServiceHealth::healthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceStatus;

    #[test]
    fn rejects_invalid_config() {
        let result = HttpBillingClient::new(BillingConfig::new(""));
        assert!(matches!(result, Err(BillingError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let client = HttpBillingClient::new(BillingConfig::new("https://billing.internal"))
            .unwrap();
        let health = client.health_check().await.unwrap();
        assert_eq!(health.status, ServiceStatus::Healthy);
    }
}
