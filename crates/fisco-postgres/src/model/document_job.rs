//! Document job model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::document_jobs;
use crate::types::{DocumentType, ProcessingStatus};

/// A document submitted for extraction, tracked through its lifecycle.
///
/// The row is the single source of truth for a job's state; queue messages
/// only carry the job ID. Exactly one of `extracted_data` / `error_message`
/// is set once the job reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = document_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentJob {
    /// Unique job identifier, also used as queue message and billing key.
    pub id: Uuid,
    /// Account that submitted the document.
    pub account_id: Uuid,
    /// Key of the uploaded file in blob storage.
    pub storage_path: String,
    /// Original file name as submitted by the client.
    pub file_name: String,
    /// Fiscal document category.
    pub document_type: DocumentType,
    /// Current lifecycle state.
    pub status: ProcessingStatus,
    /// Extraction results, set when the job completes.
    pub extracted_data: Option<serde_json::Value>,
    /// Failure description, set when the job fails.
    pub error_message: Option<String>,
    /// Timestamp when the job was submitted.
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: Timestamp,
    /// Timestamp of the last status change.
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: Timestamp,
}

/// Serializes a [`jiff_diesel::Timestamp`] through its inner [`jiff::Timestamp`].
fn serialize_timestamp<S: serde::Serializer>(
    timestamp: &Timestamp,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    timestamp.to_jiff().serialize(serializer)
}

/// Data for recording a newly submitted document job.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = document_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentJob {
    /// Job ID, generated at submission time.
    pub id: Uuid,
    /// Account that submitted the document.
    pub account_id: Uuid,
    /// Key of the uploaded file in blob storage.
    pub storage_path: String,
    /// Original file name.
    pub file_name: String,
    /// Fiscal document category.
    pub document_type: DocumentType,
}

impl NewDocumentJob {
    /// Creates a new job record with a fresh UUID v7 identifier.
    ///
    /// The ID is generated here, before the insert, so the caller can publish
    /// the queue message with the same ID the client receives.
    pub fn new(
        account_id: Uuid,
        storage_path: impl Into<String>,
        file_name: impl Into<String>,
        document_type: DocumentType,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            storage_path: storage_path.into(),
            file_name: file_name.into(),
            document_type,
        }
    }
}

impl DocumentJob {
    /// Returns whether the job reached a final state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns whether the job holds extraction results.
    #[inline]
    pub fn has_result(&self) -> bool {
        self.extracted_data.is_some()
    }

    /// Returns whether the job is owned by the given account.
    #[inline]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.account_id == account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_jobs_get_time_ordered_ids() {
        let account = Uuid::now_v7();
        let first = NewDocumentJob::new(account, "documents/a", "a.pdf", DocumentType::DasnSimei);
        let second = NewDocumentJob::new(account, "documents/b", "b.pdf", DocumentType::DasnSimei);

        assert_ne!(first.id, second.id);
        assert!(first.id < second.id);
    }
}
