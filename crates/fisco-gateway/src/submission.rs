//! Submission input and validation.

use bytes::Bytes;
use fisco_postgres::types::DocumentType;
use uuid::Uuid;

use crate::{GatewayError, Result};

/// File extensions the pipeline accepts.
const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

/// A document upload as received from the caller.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Account submitting the document.
    pub account_id: Uuid,
    /// Original file name, including its extension.
    pub file_name: String,
    /// Fiscal document category.
    pub document_type: DocumentType,
    /// Raw file content.
    pub content: Bytes,
}

impl NewSubmission {
    /// Creates a new submission.
    pub fn new(
        account_id: Uuid,
        file_name: impl Into<String>,
        document_type: DocumentType,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            account_id,
            file_name: file_name.into(),
            document_type,
            content: content.into(),
        }
    }

    /// Validates the submission and returns the normalized file extension.
    ///
    /// Runs before any side effect, so a rejected submission leaves no
    /// blob, no row, and no queue message behind.
    pub fn validate(&self, max_size_bytes: usize) -> Result<String> {
        if self.file_name.trim().is_empty() {
            return Err(GatewayError::validation("File name must not be empty"));
        }

        if self.content.is_empty() {
            return Err(GatewayError::validation("File content must not be empty"));
        }

        if self.content.len() > max_size_bytes {
            return Err(GatewayError::validation(format!(
                "File exceeds the {max_size_bytes} byte limit"
            )));
        }

        let extension = std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| GatewayError::validation("File name has no extension"))?;

        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(GatewayError::validation(format!(
                "Unsupported file type: .{extension} (accepted: pdf, png, jpg, jpeg)"
            )));
        }

        Ok(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10 * 1024 * 1024;

    fn submission(file_name: &str, content: &'static [u8]) -> NewSubmission {
        NewSubmission::new(
            Uuid::now_v7(),
            file_name,
            DocumentType::NotaFiscalEmitida,
            content,
        )
    }

    #[test]
    fn accepts_supported_extensions() {
        assert_eq!(submission("nota.pdf", b"%PDF").validate(MAX).unwrap(), "pdf");
        assert_eq!(submission("scan.PNG", b"png").validate(MAX).unwrap(), "png");
        assert_eq!(submission("foto.Jpeg", b"jpg").validate(MAX).unwrap(), "jpeg");
    }

    #[test]
    fn rejects_empty_content() {
        let result = submission("nota.pdf", b"").validate(MAX);
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[test]
    fn rejects_blank_file_name() {
        let result = submission("   ", b"%PDF").validate(MAX);
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let result = submission("virus.exe", b"MZ").validate(MAX);
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[test]
    fn rejects_oversized_content() {
        let result = submission("nota.pdf", b"too big").validate(3);
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }
}
