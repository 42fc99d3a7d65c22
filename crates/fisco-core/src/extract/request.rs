//! Request types for extraction operations.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for a document extraction operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// The pipeline job this extraction belongs to.
    pub job_id: Uuid,
    /// Raw document bytes (PDF or image).
    pub content: Bytes,
    /// MIME type of the document.
    pub mime_type: String,
    /// Document type tag guiding the structured extraction.
    pub document_type: String,
    /// Processing options.
    pub options: RequestOptions,
}

impl Request {
    /// Creates a new extraction request for a job.
    pub fn new(
        job_id: Uuid,
        content: impl Into<Bytes>,
        mime_type: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            job_id,
            content: content.into(),
            mime_type: mime_type.into(),
            document_type: document_type.into(),
            options: RequestOptions::default(),
        }
    }

    /// Sets the processing options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the document size in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Returns whether the request carries any content at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Processing options for extraction requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Expected document language (BCP 47 tag).
    pub language: Option<String>,
    /// Minimum confidence threshold for extracted fields.
    pub confidence_threshold: Option<f32>,
    /// DPI setting used when rasterizing PDFs.
    pub dpi: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            language: Some("pt-BR".to_string()),
            confidence_threshold: Some(0.5),
            dpi: Some(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_payload() {
        let job_id = Uuid::now_v7();
        let request = Request::new(job_id, &b"%PDF-1.7"[..], "application/pdf", "DASN_SIMEI");

        assert_eq!(request.job_id, job_id);
        assert_eq!(request.content_len(), 8);
        assert!(!request.is_empty());
        assert_eq!(request.options.language.as_deref(), Some("pt-BR"));
    }
}
