//! Document job repository with compare-and-set status transitions.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::Pagination;
use crate::model::{DocumentJob, NewDocumentJob};
use crate::types::{DocumentType, ProcessingStatus};
use crate::{PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for document job database operations.
///
/// Every status transition is a single `UPDATE ... WHERE status IN (...)`
/// guarded by the states the transition is valid from. With at-least-once
/// message delivery the same job ID can arrive at two workers; the guard
/// makes the second transition a no-op instead of a double-processed job,
/// and keeps terminal states immutable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentJobRepository;

impl DocumentJobRepository {
    /// Records a newly submitted job in `pending` state.
    pub async fn create_job(
        conn: &mut AsyncPgConnection,
        new_job: NewDocumentJob,
    ) -> PgResult<DocumentJob> {
        use schema::document_jobs;

        let job = diesel::insert_into(document_jobs::table)
            .values(&new_job)
            .returning(DocumentJob::as_returning())
            .get_result(conn)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            job_id = %job.id,
            account_id = %job.account_id,
            document_type = %job.document_type,
            "Document job recorded"
        );

        Ok(job)
    }

    /// Finds a job by its unique identifier.
    pub async fn find_job_by_id(
        conn: &mut AsyncPgConnection,
        job_id: Uuid,
    ) -> PgResult<Option<DocumentJob>> {
        use schema::document_jobs::{self, dsl};

        let job = document_jobs::table
            .filter(dsl::id.eq(job_id))
            .select(DocumentJob::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(job)
    }

    /// Lists jobs submitted by an account, newest first.
    ///
    /// When `document_type` is given, only jobs of that category are
    /// returned.
    pub async fn find_jobs_by_account(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
        document_type: Option<DocumentType>,
        pagination: Pagination,
    ) -> PgResult<Vec<DocumentJob>> {
        use schema::document_jobs::{self, dsl};

        let mut query = document_jobs::table
            .filter(dsl::account_id.eq(account_id))
            .into_boxed();

        if let Some(document_type) = document_type {
            query = query.filter(dsl::document_type.eq(document_type));
        }

        let jobs = query
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(DocumentJob::as_select())
            .load(conn)
            .await
            .map_err(PgError::from)?;

        Ok(jobs)
    }

    /// Atomically claims a job for processing.
    ///
    /// Succeeds only when the job is still in `pending` or `processing`;
    /// a claim on a `processing` job restamps `updated_at` so a crashed
    /// worker's redelivered message can be picked up again. Returns `None`
    /// when the job is already terminal, in which case the caller should
    /// discard the message.
    pub async fn claim_job(
        conn: &mut AsyncPgConnection,
        job_id: Uuid,
    ) -> PgResult<Option<DocumentJob>> {
        use diesel::dsl::now;
        use schema::document_jobs::{self, dsl};

        let job = diesel::update(
            document_jobs::table
                .filter(dsl::id.eq(job_id))
                .filter(dsl::status.eq_any(ProcessingStatus::claimable_statuses())),
        )
        .set((
            dsl::status.eq(ProcessingStatus::Processing),
            dsl::updated_at.eq(now),
        ))
        .returning(DocumentJob::as_returning())
        .get_result(conn)
        .await
        .optional()
        .map_err(PgError::from)?;

        match &job {
            Some(job) => tracing::debug!(
                target: TRACING_TARGET_QUERY,
                job_id = %job.id,
                "Job claimed for processing"
            ),
            None => tracing::debug!(
                target: TRACING_TARGET_QUERY,
                job_id = %job_id,
                "Claim rejected, job missing or already terminal"
            ),
        }

        Ok(job)
    }

    /// Marks a claimed job as completed and stores the extraction results.
    ///
    /// Only valid from `processing`. Returns `None` when the job already
    /// settled, leaving the earlier outcome untouched.
    pub async fn complete_job(
        conn: &mut AsyncPgConnection,
        job_id: Uuid,
        extracted_data: serde_json::Value,
    ) -> PgResult<Option<DocumentJob>> {
        use diesel::dsl::now;
        use schema::document_jobs::{self, dsl};

        let job = diesel::update(
            document_jobs::table
                .filter(dsl::id.eq(job_id))
                .filter(dsl::status.eq(ProcessingStatus::Processing)),
        )
        .set((
            dsl::status.eq(ProcessingStatus::Completed),
            dsl::extracted_data.eq(Some(extracted_data)),
            dsl::error_message.eq(None::<String>),
            dsl::updated_at.eq(now),
        ))
        .returning(DocumentJob::as_returning())
        .get_result(conn)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(job)
    }

    /// Marks a claimed job as permanently failed and stores the error.
    ///
    /// Only valid from `processing`. Returns `None` when the job already
    /// settled.
    pub async fn fail_job(
        conn: &mut AsyncPgConnection,
        job_id: Uuid,
        error_message: &str,
    ) -> PgResult<Option<DocumentJob>> {
        use diesel::dsl::now;
        use schema::document_jobs::{self, dsl};

        let job = diesel::update(
            document_jobs::table
                .filter(dsl::id.eq(job_id))
                .filter(dsl::status.eq(ProcessingStatus::Processing)),
        )
        .set((
            dsl::status.eq(ProcessingStatus::Failed),
            dsl::error_message.eq(Some(error_message)),
            dsl::extracted_data.eq(None::<serde_json::Value>),
            dsl::updated_at.eq(now),
        ))
        .returning(DocumentJob::as_returning())
        .get_result(conn)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(job)
    }

    /// Finds jobs that have been sitting in `pending` since before `cutoff`.
    ///
    /// These are jobs whose queue publish was lost after the row was
    /// inserted; the reconciliation sweep re-publishes them. Ordered oldest
    /// first so the longest-stuck jobs recover first.
    pub async fn find_stale_pending_jobs(
        conn: &mut AsyncPgConnection,
        cutoff: jiff::Timestamp,
        limit: i64,
    ) -> PgResult<Vec<DocumentJob>> {
        use schema::document_jobs::{self, dsl};

        let jobs = document_jobs::table
            .filter(dsl::status.eq(ProcessingStatus::Pending))
            .filter(dsl::created_at.lt(jiff_diesel::Timestamp::from(cutoff)))
            .order(dsl::created_at.asc())
            .limit(limit)
            .select(DocumentJob::as_select())
            .load(conn)
            .await
            .map_err(PgError::from)?;

        Ok(jobs)
    }
}
