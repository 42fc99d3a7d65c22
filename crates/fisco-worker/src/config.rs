//! Worker pool configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration for the document worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkerConfig {
    /// Number of concurrent worker tasks sharing the durable consumer
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-concurrency",
            env = "WORKER_CONCURRENCY",
            default_value = "4"
        )
    )]
    #[serde(default = "default_concurrency")]
    pub worker_concurrency: usize,

    /// Timeout for a single extraction attempt in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-extract-timeout",
            env = "WORKER_EXTRACT_TIMEOUT_SECS",
            default_value = "120"
        )
    )]
    #[serde(default = "default_extract_timeout")]
    pub worker_extract_timeout: u64,

    /// In-process attempts per delivery for transient extraction errors
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-extract-attempts",
            env = "WORKER_EXTRACT_ATTEMPTS",
            default_value = "3"
        )
    )]
    #[serde(default = "default_extract_attempts")]
    pub worker_extract_attempts: u32,

    /// Base redelivery delay in seconds, doubled per delivery attempt
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-retry-base",
            env = "WORKER_RETRY_BASE_SECS",
            default_value = "5"
        )
    )]
    #[serde(default = "default_retry_base")]
    pub worker_retry_base: u64,

    /// Upper bound on the redelivery delay in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-retry-max",
            env = "WORKER_RETRY_MAX_SECS",
            default_value = "120"
        )
    )]
    #[serde(default = "default_retry_max")]
    pub worker_retry_max: u64,

    /// Charge per completed job in cents; 0 disables billing
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-charge-amount",
            env = "WORKER_CHARGE_AMOUNT_CENTS",
            default_value = "0"
        )
    )]
    #[serde(default)]
    pub worker_charge_amount_cents: i64,
}

fn default_concurrency() -> usize {
    4
}

fn default_extract_timeout() -> u64 {
    120
}

fn default_extract_attempts() -> u32 {
    3
}

fn default_retry_base() -> u64 {
    5
}

fn default_retry_max() -> u64 {
    120
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: default_concurrency(),
            worker_extract_timeout: default_extract_timeout(),
            worker_extract_attempts: default_extract_attempts(),
            worker_retry_base: default_retry_base(),
            worker_retry_max: default_retry_max(),
            worker_charge_amount_cents: 0,
        }
    }
}

impl WorkerConfig {
    /// Returns the extraction attempt timeout.
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_extract_timeout)
    }

    /// Returns the base redelivery delay.
    pub fn retry_base(&self) -> Duration {
        Duration::from_secs(self.worker_retry_base)
    }

    /// Returns the redelivery delay ceiling.
    pub fn retry_max(&self) -> Duration {
        Duration::from_secs(self.worker_retry_max)
    }

    /// Returns whether completed jobs should be charged.
    #[inline]
    pub fn billing_enabled(&self) -> bool {
        self.worker_charge_amount_cents > 0
    }

    /// Set the number of concurrent worker tasks.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.worker_concurrency = concurrency.max(1);
        self
    }

    /// Set the per-job charge in cents.
    #[must_use]
    pub fn with_charge_amount_cents(mut self, cents: i64) -> Self {
        self.worker_charge_amount_cents = cents;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_is_off_by_default() {
        let config = WorkerConfig::default();
        assert!(!config.billing_enabled());
        assert_eq!(config.worker_concurrency, 4);
    }

    #[test]
    fn builder_enables_billing() {
        let config = WorkerConfig::default().with_charge_amount_cents(250);
        assert!(config.billing_enabled());
    }

    #[test]
    fn concurrency_floor_is_one() {
        let config = WorkerConfig::default().with_concurrency(0);
        assert_eq!(config.worker_concurrency, 1);
    }
}
