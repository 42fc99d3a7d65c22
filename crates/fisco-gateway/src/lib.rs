#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod service;
mod submission;
mod sweep;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use service::DocumentService;
pub use submission::NewSubmission;
pub use sweep::ReconciliationSweep;

/// Tracing target for gateway operations.
pub const TRACING_TARGET_GATEWAY: &str = "fisco_gateway::submit";

/// Tracing target for the reconciliation sweep.
pub const TRACING_TARGET_SWEEP: &str = "fisco_gateway::sweep";
