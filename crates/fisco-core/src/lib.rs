#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Fisco Core
//!
//! This crate provides the foundational abstractions for the document
//! extraction step of the fisco pipeline. It defines the trait the worker
//! calls into without depending on any concrete OCR implementation.

/// Tracing target for extraction operations.
pub const TRACING_TARGET_EXTRACT: &str = "fisco_core::extract";

mod health;

pub mod extract;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use health::{ServiceHealth, ServiceStatus};
