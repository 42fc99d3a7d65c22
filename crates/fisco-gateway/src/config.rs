//! Gateway configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration for the submission gateway and its reconciliation sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct GatewayConfig {
    /// Maximum accepted upload size in bytes
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gateway-max-upload-bytes",
            env = "GATEWAY_MAX_UPLOAD_BYTES",
            default_value = "10485760"
        )
    )]
    #[serde(default = "default_max_upload_bytes")]
    pub gateway_max_upload_bytes: usize,

    /// Seconds between reconciliation sweep runs
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gateway-sweep-interval",
            env = "GATEWAY_SWEEP_INTERVAL_SECS",
            default_value = "60"
        )
    )]
    #[serde(default = "default_sweep_interval")]
    pub gateway_sweep_interval: u64,

    /// Minimum age in seconds before a pending job counts as stuck
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gateway-sweep-cutoff",
            env = "GATEWAY_SWEEP_CUTOFF_SECS",
            default_value = "300"
        )
    )]
    #[serde(default = "default_sweep_cutoff")]
    pub gateway_sweep_cutoff: u64,

    /// Maximum jobs re-published per sweep run
    #[cfg_attr(
        feature = "config",
        arg(
            long = "gateway-sweep-batch",
            env = "GATEWAY_SWEEP_BATCH",
            default_value = "100"
        )
    )]
    #[serde(default = "default_sweep_batch")]
    pub gateway_sweep_batch: i64,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sweep_cutoff() -> u64 {
    300
}

fn default_sweep_batch() -> i64 {
    100
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_max_upload_bytes: default_max_upload_bytes(),
            gateway_sweep_interval: default_sweep_interval(),
            gateway_sweep_cutoff: default_sweep_cutoff(),
            gateway_sweep_batch: default_sweep_batch(),
        }
    }
}

impl GatewayConfig {
    /// Returns the sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.gateway_sweep_interval.max(1))
    }

    /// Returns the stuck-pending age cutoff.
    ///
    /// Must comfortably exceed the worst-case submit-to-claim latency,
    /// otherwise the sweep re-publishes jobs that are merely slow and
    /// duplicates deliveries for no benefit.
    pub fn sweep_cutoff(&self) -> Duration {
        Duration::from_secs(self.gateway_sweep_cutoff)
    }

    /// Set the maximum upload size.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.gateway_max_upload_bytes = bytes;
        self
    }

    /// Set the sweep batch size.
    #[must_use]
    pub fn with_sweep_batch(mut self, batch: i64) -> Self {
        self.gateway_sweep_batch = batch.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GatewayConfig::default();
        assert_eq!(config.gateway_max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.sweep_cutoff() > config.sweep_interval());
    }

    #[test]
    fn sweep_interval_has_a_floor() {
        let mut config = GatewayConfig::default();
        config.gateway_sweep_interval = 0;
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
