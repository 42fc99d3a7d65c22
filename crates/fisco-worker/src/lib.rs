#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod disposition;
mod error;
mod worker;

pub use config::WorkerConfig;
pub use disposition::{FailureDisposition, classify_infra_failure, retry_backoff};
pub use error::{Result, WorkerError};
pub use worker::{ExtractionWorker, JobOutcome};

/// Tracing target for worker operations.
pub const TRACING_TARGET_WORKER: &str = "fisco_worker::loop";
