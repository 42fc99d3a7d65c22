//! Response types for extraction operations.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response from a document extraction operation.
///
/// The `fields` payload is what ultimately lands in the job's
/// `extracted_data` column once the job completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this response.
    pub response_id: Uuid,
    /// Request ID this response corresponds to.
    pub request_id: Uuid,
    /// Raw extracted text content.
    pub text: String,
    /// Structured fields keyed by the document type's schema.
    pub fields: serde_json::Value,
    /// Overall confidence score for the extraction.
    pub confidence: Option<f32>,
    /// Number of pages processed.
    pub pages_processed: u32,
    /// Processing time in milliseconds.
    pub processing_time_ms: Option<u64>,
    /// When this response was generated.
    pub timestamp: Timestamp,
}

impl Response {
    /// Creates a new extraction response.
    pub fn new(request_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            response_id: Uuid::now_v7(),
            request_id,
            text: text.into(),
            fields: serde_json::Value::Null,
            confidence: None,
            pages_processed: 1,
            processing_time_ms: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Sets the structured fields.
    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the confidence score.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Sets the number of pages processed.
    pub fn with_pages_processed(mut self, pages: u32) -> Self {
        self.pages_processed = pages;
        self
    }

    /// Sets the processing time.
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    /// Checks whether any text was extracted.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Checks whether structured fields were extracted.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_null()
    }

    /// Builds the result payload persisted on the completed job.
    ///
    /// Always an object so the stored column stays queryable: the raw text
    /// under `"text"`, structured fields under `"fields"`.
    pub fn into_result_payload(self) -> serde_json::Value {
        serde_json::json!({
            "text": self.text,
            "fields": self.fields,
            "confidence": self.confidence,
            "pages": self.pages_processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_payload_shape() {
        let response = Response::new(Uuid::now_v7(), "NFS-e 2024")
            .with_fields(serde_json::json!({"valor_total": 1250.0}))
            .with_confidence(0.93);

        assert!(response.has_text());
        assert!(response.has_fields());

        let payload = response.into_result_payload();
        assert_eq!(payload["text"], "NFS-e 2024");
        assert_eq!(payload["fields"]["valor_total"], 1250.0);
        assert_eq!(payload["pages"], 1);
    }
}
