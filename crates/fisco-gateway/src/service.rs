//! The document submission service.

use fisco_nats::RetryConfig;
use fisco_nats::queue::{JobMessage, OcrQueue};
use fisco_opendal::{DocumentKey, StorageBackend};
use fisco_postgres::PgClient;
use fisco_postgres::model::{DocumentJob, NewDocumentJob};
use fisco_postgres::query::{DocumentJobRepository, Pagination};
use fisco_postgres::types::DocumentType;
use uuid::Uuid;

use crate::{GatewayConfig, GatewayError, NewSubmission, Result, TRACING_TARGET_GATEWAY};

/// Submission gateway service.
///
/// This is the struct an HTTP layer calls into; it owns the submit flow
/// (validate, blob write, row insert, queue publish) and the
/// ownership-checked read paths. Cloning is cheap, all fields are handles.
#[derive(Debug, Clone)]
pub struct DocumentService {
    pg: PgClient,
    storage: StorageBackend,
    queue: OcrQueue,
    publish_retry: RetryConfig,
    config: GatewayConfig,
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        pg: PgClient,
        storage: StorageBackend,
        queue: OcrQueue,
        config: GatewayConfig,
    ) -> Self {
        Self {
            pg,
            storage,
            queue,
            publish_retry: RetryConfig::default(),
            config,
        }
    }

    /// Overrides the retry policy used for queue publishes.
    #[must_use]
    pub fn with_publish_retry(mut self, retry: RetryConfig) -> Self {
        self.publish_retry = retry;
        self
    }

    /// Submits a document for processing.
    ///
    /// Side effects happen in a fixed order: blob write, then job insert,
    /// then queue publish. The returned job is in `pending` state; workers
    /// move it forward from there.
    ///
    /// A failed publish still returns an error, but the job row survives
    /// and the reconciliation sweep re-publishes it, so callers can treat
    /// the error as "accepted, delayed" rather than lost.
    pub async fn submit_document(&self, submission: NewSubmission) -> Result<DocumentJob> {
        let extension = submission.validate(self.config.gateway_max_upload_bytes)?;

        let key = DocumentKey::generate(submission.account_id, extension);
        self.storage
            .write(&key.to_string(), &submission.content)
            .await?;

        let new_job = NewDocumentJob::new(
            submission.account_id,
            key.to_string(),
            submission.file_name,
            submission.document_type,
        );

        let mut conn = self.pg.get_connection().await?;
        let job = DocumentJobRepository::create_job(&mut conn, new_job).await?;
        drop(conn);

        tracing::info!(
            target: TRACING_TARGET_GATEWAY,
            job_id = %job.id,
            account_id = %job.account_id,
            document_type = %job.document_type,
            size_bytes = submission.content.len(),
            "Document submitted"
        );

        let message = JobMessage::new(job.id);
        self.publish_retry
            .retry(|| self.queue.publish(&message))
            .await?;

        Ok(job)
    }

    /// Fetches a job, enforcing ownership.
    ///
    /// Returns `Forbidden` without any job data when the requester is not
    /// the owner.
    pub async fn get_document(&self, account_id: Uuid, job_id: Uuid) -> Result<DocumentJob> {
        let mut conn = self.pg.get_connection().await?;

        let job = DocumentJobRepository::find_job_by_id(&mut conn, job_id)
            .await?
            .ok_or(GatewayError::NotFound(job_id))?;

        if !job.is_owned_by(account_id) {
            tracing::warn!(
                target: TRACING_TARGET_GATEWAY,
                job_id = %job_id,
                requester = %account_id,
                "Cross-account job access denied"
            );
            return Err(GatewayError::Forbidden);
        }

        Ok(job)
    }

    /// Lists an account's jobs, newest first, optionally filtered by
    /// document type.
    pub async fn list_documents(
        &self,
        account_id: Uuid,
        document_type: Option<DocumentType>,
        pagination: Pagination,
    ) -> Result<Vec<DocumentJob>> {
        let mut conn = self.pg.get_connection().await?;

        let jobs = DocumentJobRepository::find_jobs_by_account(
            &mut conn,
            account_id,
            document_type,
            pagination,
        )
        .await?;

        Ok(jobs)
    }

    /// Gets the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
