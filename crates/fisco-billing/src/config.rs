//! Billing client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{BillingError, Result};

/// Default timeout for ledger requests: 15 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the billing ledger HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct BillingConfig {
    /// Base URL of the billing ledger service; unset disables billing
    #[cfg_attr(
        feature = "config",
        arg(long = "billing-base-url", env = "BILLING_BASE_URL")
    )]
    pub billing_base_url: Option<String>,

    /// Bearer token used to authenticate against the ledger
    #[cfg_attr(
        feature = "config",
        arg(long = "billing-api-token", env = "BILLING_API_TOKEN")
    )]
    pub billing_api_token: Option<String>,

    /// Request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "billing-timeout",
            env = "BILLING_TIMEOUT_SECS",
            default_value = "15"
        )
    )]
    #[serde(default = "default_timeout_secs")]
    pub billing_timeout: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl BillingConfig {
    /// Creates a new configuration for the given ledger base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            billing_base_url: Some(base_url.into()),
            billing_api_token: None,
            billing_timeout: default_timeout_secs(),
        }
    }

    /// Returns whether a ledger endpoint is configured.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.billing_base_url.is_some()
    }

    /// Returns the request timeout, falling back to the default if zero.
    pub fn timeout(&self) -> Duration {
        if self.billing_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.billing_timeout)
        }
    }

    /// Returns the URL charges are posted to.
    ///
    /// Meaningful only after [`validate`](Self::validate) passed.
    pub fn charges_url(&self) -> String {
        let base = self.billing_base_url.as_deref().unwrap_or_default();
        format!("{}/charges", base.trim_end_matches('/'))
    }

    /// Set the authentication token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.billing_api_token = Some(token.into());
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.billing_timeout = secs;
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        let Some(base_url) = self.billing_base_url.as_deref() else {
            return Err(BillingError::invalid_config("Base URL is not set"));
        };
        if base_url.is_empty() {
            return Err(BillingError::invalid_config("Base URL cannot be empty"));
        }
        if url::Url::parse(base_url).is_err() {
            return Err(BillingError::invalid_config(format!(
                "Invalid base URL: {base_url}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = BillingConfig::new("https://billing.internal");
        assert_eq!(config.timeout(), Duration::from_secs(15));

        let zero = config.clone().with_timeout_secs(0);
        assert_eq!(zero.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_charges_url_strips_trailing_slash() {
        let config = BillingConfig::new("https://billing.internal/");
        assert_eq!(config.charges_url(), "https://billing.internal/charges");
    }

    #[test]
    fn test_validation() {
        assert!(BillingConfig::new("https://billing.internal").validate().is_ok());
        assert!(BillingConfig::new("").validate().is_err());
        assert!(BillingConfig::new("not a url").validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = BillingConfig::new("https://billing.internal")
            .with_api_token("secret")
            .with_timeout_secs(30);

        assert_eq!(config.billing_api_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
