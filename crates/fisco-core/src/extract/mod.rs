//! Document data extraction abstractions.
//!
//! This module provides the trait and types for turning an uploaded fiscal
//! document (PDF or image bytes) into structured data. The worker treats the
//! implementation as a black box: it only cares about success, a retryable
//! failure, or a permanent failure.

use std::sync::Arc;

mod error;
mod request;
mod response;
mod service;

pub use error::{Error, ErrorKind, Result};
pub use request::{Request, RequestOptions};
pub use response::Response;
pub use service::ExtractService;

use crate::ServiceHealth;

/// Type alias for a boxed extraction provider.
pub type BoxedExtractProvider = Arc<dyn Extract + Send + Sync>;

/// Core trait for document data extraction.
///
/// Implementations wrap a concrete OCR/extraction backend. The pipeline never
/// inspects how extraction happens; it only consumes the structured response
/// or the classified error.
#[async_trait::async_trait]
pub trait Extract: Send + Sync {
    /// Extracts structured data from the document in the request.
    ///
    /// Takes ownership of the request so implementations can forward the
    /// payload without copying it.
    async fn extract(&self, request: Request) -> Result<Response>;

    /// Performs a health check against the extraction backend.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
