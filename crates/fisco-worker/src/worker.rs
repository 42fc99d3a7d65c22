//! The extraction worker loop.

use std::sync::Arc;

use fisco_billing::{BillingProvider, ChargeRequest};
use fisco_core::extract::{Extract, ExtractService, Request};
use fisco_nats::queue::{DeliveredJob, OcrQueue};
use fisco_opendal::StorageBackend;
use fisco_postgres::PgClient;
use fisco_postgres::query::DocumentJobRepository;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::disposition::{classify_failure, classify_infra_failure, FailureDisposition};
use crate::{Result, WorkerConfig, TRACING_TARGET_WORKER};

/// How a single delivery was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Extraction succeeded and the job settled as `completed`.
    Completed,
    /// The job settled as `failed` with a terminal error.
    Failed,
    /// The delivery was discarded: row missing or job already terminal.
    Discarded,
    /// Transient failure; redelivery requested after the delay.
    Retry(std::time::Duration),
}

/// A single worker task: pulls job IDs, claims rows, runs extraction,
/// settles jobs.
///
/// Several workers can run concurrently against the same durable consumer;
/// the compare-and-set claim in the job store keeps duplicate deliveries
/// from producing duplicate outcomes.
pub struct ExtractionWorker<E> {
    pg: PgClient,
    storage: StorageBackend,
    queue: OcrQueue,
    extractor: ExtractService<E>,
    billing: Option<Arc<dyn BillingProvider>>,
    config: WorkerConfig,
    cancel_token: CancellationToken,
}

impl<E> ExtractionWorker<E>
where
    E: Extract + Send + Sync + 'static,
{
    /// Creates a new worker.
    pub fn new(
        pg: PgClient,
        storage: StorageBackend,
        queue: OcrQueue,
        extractor: ExtractService<E>,
        config: WorkerConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            pg,
            storage,
            queue,
            extractor,
            billing: None,
            config,
            cancel_token,
        }
    }

    /// Attaches a billing provider; completed jobs are charged when the
    /// configured amount is positive.
    #[must_use]
    pub fn with_billing(mut self, billing: Arc<dyn BillingProvider>) -> Self {
        self.billing = Some(billing);
        self
    }

    /// Spawns the worker as a background task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Runs the worker loop until cancelled.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET_WORKER,
            billing = self.billing.is_some() && self.config.billing_enabled(),
            "Starting extraction worker"
        );

        let mut stream = self.queue.subscribe().await?;

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET_WORKER,
                        "Shutdown requested, stopping worker"
                    );
                    break;
                }

                delivery = stream.next() => {
                    match delivery {
                        Some(Ok(job)) => self.handle_delivery(job).await,
                        Some(Err(err)) => {
                            tracing::error!(
                                target: TRACING_TARGET_WORKER,
                                error = %err,
                                "Failed to receive job message"
                            );
                        }
                        None => {
                            tracing::warn!(
                                target: TRACING_TARGET_WORKER,
                                "Consumer stream ended, stopping worker"
                            );
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one delivery and acknowledges it accordingly.
    ///
    /// The message is acknowledged only after the terminal store write, so
    /// a crash mid-processing leads to redelivery and the claim guard
    /// decides whether the retry resumes or no-ops.
    async fn handle_delivery(&self, delivered: DeliveredJob) {
        let job_id = delivered.message().job_id;
        let attempt = delivered.delivery_attempt().unwrap_or(1);

        let outcome = match self.process(job_id, attempt).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let disposition = classify_infra_failure(
                    &err,
                    attempt,
                    self.queue.max_deliver(),
                    self.config.retry_base(),
                    self.config.retry_max(),
                );

                match disposition {
                    FailureDisposition::Retry(delay) => {
                        tracing::warn!(
                            target: TRACING_TARGET_WORKER,
                            job_id = %job_id,
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %err,
                            "Infrastructure failure, requesting redelivery"
                        );
                        JobOutcome::Retry(delay)
                    }
                    FailureDisposition::Fail(message) => {
                        self.fail_on_last_delivery(job_id, attempt, &message).await
                    }
                }
            }
        };

        let ack_result = match outcome {
            JobOutcome::Completed | JobOutcome::Failed | JobOutcome::Discarded => {
                delivered.ack().await
            }
            JobOutcome::Retry(delay) => delivered.nak(Some(delay)).await,
        };

        if let Err(err) = ack_result {
            tracing::error!(
                target: TRACING_TARGET_WORKER,
                job_id = %job_id,
                error = %err,
                "Failed to acknowledge message"
            );
        }
    }

    /// Runs the claim → extract → settle sequence for one job ID.
    async fn process(&self, job_id: Uuid, attempt: i64) -> Result<JobOutcome> {
        let mut conn = self.pg.get_connection().await?;

        let Some(job) = DocumentJobRepository::find_job_by_id(&mut conn, job_id).await? else {
            tracing::warn!(
                target: TRACING_TARGET_WORKER,
                job_id = %job_id,
                "Queue message references a missing job row, discarding"
            );
            return Ok(JobOutcome::Discarded);
        };

        let Some(claimed) = DocumentJobRepository::claim_job(&mut conn, job.id).await? else {
            tracing::debug!(
                target: TRACING_TARGET_WORKER,
                job_id = %job_id,
                status = %job.status,
                "Duplicate delivery of a settled job, discarding"
            );
            return Ok(JobOutcome::Discarded);
        };

        tracing::info!(
            target: TRACING_TARGET_WORKER,
            job_id = %job_id,
            attempt,
            document_type = %claimed.document_type,
            "Processing job"
        );

        let content = match self.storage.read(&claimed.storage_path).await {
            Ok(content) => content,
            Err(err) if err.is_transient() => return Err(err.into()),
            Err(err) => {
                let message = format!("Stored document unavailable: {err}");
                DocumentJobRepository::fail_job(&mut conn, job_id, &message).await?;
                return Ok(JobOutcome::Failed);
            }
        };

        let request = Request::new(
            job_id,
            content,
            mime_type_for(&claimed.file_name),
            claimed.document_type.to_string(),
        );

        match self.extractor.extract(request).await {
            Ok(response) => {
                let payload = response.into_result_payload();
                let settled =
                    DocumentJobRepository::complete_job(&mut conn, job_id, payload).await?;

                match settled {
                    Some(_) => {
                        self.charge_completed(claimed.account_id, &claimed.file_name, job_id)
                            .await;
                        Ok(JobOutcome::Completed)
                    }
                    None => {
                        // Another worker settled the job between our claim
                        // and our write; its outcome stands.
                        tracing::debug!(
                            target: TRACING_TARGET_WORKER,
                            job_id = %job_id,
                            "Job already settled, discarding result"
                        );
                        Ok(JobOutcome::Discarded)
                    }
                }
            }
            Err(error) => {
                let disposition = classify_failure(
                    &error,
                    attempt,
                    self.queue.max_deliver(),
                    self.config.retry_base(),
                    self.config.retry_max(),
                );

                match disposition {
                    FailureDisposition::Retry(delay) => {
                        tracing::warn!(
                            target: TRACING_TARGET_WORKER,
                            job_id = %job_id,
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %error,
                            "Extraction failed transiently, requesting redelivery"
                        );
                        Ok(JobOutcome::Retry(delay))
                    }
                    FailureDisposition::Fail(message) => {
                        DocumentJobRepository::fail_job(&mut conn, job_id, &message).await?;
                        tracing::warn!(
                            target: TRACING_TARGET_WORKER,
                            job_id = %job_id,
                            attempt,
                            error = %message,
                            "Job settled as failed"
                        );
                        Ok(JobOutcome::Failed)
                    }
                }
            }
        }
    }

    /// Settles a job whose final delivery hit an infrastructure error.
    ///
    /// The queue will not redeliver after this attempt, so the row must
    /// reach a terminal state now. The `fail_job` guard only fires on
    /// `processing` rows: a job that was never claimed stays `pending` and
    /// the reconciliation sweep re-publishes it with a fresh delivery
    /// budget.
    async fn fail_on_last_delivery(&self, job_id: Uuid, attempt: i64, message: &str) -> JobOutcome {
        let settled: Result<_> = async {
            let mut conn = self.pg.get_connection().await?;
            Ok(DocumentJobRepository::fail_job(&mut conn, job_id, message).await?)
        }
        .await;

        match settled {
            Ok(Some(_)) => {
                tracing::warn!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    attempt,
                    error = %message,
                    "Redelivery budget exhausted, job settled as failed"
                );
                JobOutcome::Failed
            }
            Ok(None) => {
                // Not in `processing`: already terminal, or still `pending`
                // and the sweep's responsibility.
                tracing::debug!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    "Job not claimable for terminal failure, discarding delivery"
                );
                JobOutcome::Discarded
            }
            Err(err) => {
                // The store is unreachable too; a nak keeps the message
                // alive in case the consumer grants one more delivery.
                tracing::error!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    attempt,
                    error = %err,
                    "Failed to settle job on final delivery"
                );
                JobOutcome::Retry(self.config.retry_max())
            }
        }
    }

    /// Charges the account for a completed job.
    ///
    /// Never propagates errors: the job is already settled, and the ledger
    /// deduplicates on the job ID, so a lost charge is recovered on the
    /// next redelivered duplicate at worst. Billing failures must not
    /// unsettle a completed job.
    async fn charge_completed(&self, account_id: Uuid, file_name: &str, job_id: Uuid) {
        let Some(billing) = &self.billing else {
            return;
        };
        if !self.config.billing_enabled() {
            return;
        }

        let request = ChargeRequest::new(
            account_id,
            self.config.worker_charge_amount_cents,
            format!("Document extraction: {file_name}"),
            job_id,
        );

        match billing.charge(&request).await {
            Ok(outcome) if outcome.is_charged() => {
                tracing::debug!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    "Job charged"
                );
            }
            Ok(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    account_id = %account_id,
                    "Charge declined: insufficient funds"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_WORKER,
                    job_id = %job_id,
                    error = %err,
                    "Failed to charge completed job"
                );
            }
        }
    }
}

impl<E> std::fmt::Debug for ExtractionWorker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionWorker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Maps a file name to the MIME type passed to the extraction backend.
fn mime_type_for(file_name: &str) -> &'static str {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use fisco_billing::memory::MemoryLedger;
    use fisco_core::mock::MockExtractor;

    use super::*;

    #[test]
    fn mime_types_cover_accepted_uploads() {
        assert_eq!(mime_type_for("nota.pdf"), "application/pdf");
        assert_eq!(mime_type_for("scan.PNG"), "image/png");
        assert_eq!(mime_type_for("foto.jpeg"), "image/jpeg");
        assert_eq!(mime_type_for("foto.jpg"), "image/jpeg");
        assert_eq!(mime_type_for("unknown"), "application/octet-stream");
    }

    #[tokio::test]
    async fn redelivered_completion_charges_once() {
        let ledger = MemoryLedger::new();
        let account_id = Uuid::now_v7();
        let job_id = Uuid::now_v7();

        // Same charge the worker issues after complete_job, replayed as a
        // redelivery would replay it.
        for _ in 0..3 {
            let request =
                ChargeRequest::new(account_id, 250, "Document extraction: nota.pdf", job_id);
            let outcome = ledger.charge(&request).await.unwrap();
            assert!(outcome.is_charged());
        }

        assert_eq!(ledger.charge_count(), 1);
    }

    #[tokio::test]
    async fn mock_extractor_drives_payload_shape() {
        let extractor = MockExtractor::succeeding(
            "NFe 42",
            serde_json::json!({"cnpj": "00.000.000/0001-00"}),
        );
        let service = ExtractService::new(extractor);

        let request = Request::new(
            Uuid::now_v7(),
            &b"%PDF-1.7"[..],
            "application/pdf",
            "nota_fiscal_emitida",
        );
        let response = service.extract(request).await.unwrap();
        let payload = response.into_result_payload();

        assert_eq!(payload["text"], "NFe 42");
        assert_eq!(payload["fields"]["cnpj"], "00.000.000/0001-00");
        assert_eq!(payload["pages"], 1);
    }
}
