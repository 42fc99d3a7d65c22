#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod charge;
mod client;
mod config;
mod error;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod memory;

pub use charge::{ChargeOutcome, ChargeReceipt, ChargeRequest};
pub use client::HttpBillingClient;
pub use config::BillingConfig;
pub use error::{BillingError, Result};
pub use fisco_core::{ServiceHealth, ServiceStatus};

/// Tracing target for billing operations.
pub const TRACING_TARGET: &str = "fisco_billing::ledger";

/// Core trait for billing ledger operations.
///
/// Implementations must be idempotent per job ID: charging the same job
/// twice must produce at most one ledger entry.
#[async_trait::async_trait]
pub trait BillingProvider: Send + Sync {
    /// Charges an account for a processed job.
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome>;

    /// Performs a health check on the billing provider.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
