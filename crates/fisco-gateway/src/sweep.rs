//! Reconciliation sweep for jobs whose queue publish was lost.
//!
//! Submission is two writes with a gap: the job row insert and the queue
//! publish. A crash or NATS outage between them leaves a row in `pending`
//! that no worker will ever see. The sweep periodically re-publishes such
//! rows instead of requiring a transactional outbox; duplicate publishes
//! are harmless because the claim guard already absorbs duplicate
//! deliveries.

use fisco_nats::queue::{JobMessage, OcrQueue};
use fisco_postgres::PgClient;
use fisco_postgres::query::DocumentJobRepository;
use jiff::Timestamp;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{GatewayConfig, Result, TRACING_TARGET_SWEEP};

/// Periodic task that re-publishes stuck pending jobs.
pub struct ReconciliationSweep {
    pg: PgClient,
    queue: OcrQueue,
    config: GatewayConfig,
    cancel_token: CancellationToken,
}

impl ReconciliationSweep {
    /// Creates a new sweep task.
    pub fn new(
        pg: PgClient,
        queue: OcrQueue,
        config: GatewayConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            pg,
            queue,
            config,
            cancel_token,
        }
    }

    /// Spawns the sweep as a background task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Runs the sweep loop until cancelled.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET_SWEEP,
            interval_secs = self.config.gateway_sweep_interval,
            cutoff_secs = self.config.gateway_sweep_cutoff,
            batch = self.config.gateway_sweep_batch,
            "Starting reconciliation sweep"
        );

        let mut ticker = tokio::time::interval(self.config.sweep_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET_SWEEP,
                        "Shutdown requested, stopping sweep"
                    );
                    break;
                }

                _ = ticker.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        tracing::error!(
                            target: TRACING_TARGET_SWEEP,
                            error = %err,
                            "Sweep run failed, retrying on next tick"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Re-publishes one batch of stuck pending jobs.
    ///
    /// Bounded by the configured batch size so a large backlog cannot
    /// monopolize a tick.
    pub async fn sweep_once(&self) -> Result<usize> {
        let cutoff = Timestamp::now()
            .saturating_sub(self.config.sweep_cutoff())
            .expect("subtracting a std Duration from a timestamp saturates and never fails");

        let mut conn = self.pg.get_connection().await?;
        let stuck = DocumentJobRepository::find_stale_pending_jobs(
            &mut conn,
            cutoff,
            self.config.gateway_sweep_batch,
        )
        .await?;
        drop(conn);

        if stuck.is_empty() {
            return Ok(0);
        }

        tracing::warn!(
            target: TRACING_TARGET_SWEEP,
            count = stuck.len(),
            "Re-publishing stuck pending jobs"
        );

        let mut republished = 0;
        for job in &stuck {
            let message = JobMessage::new(job.id);
            match self.queue.publish(&message).await {
                Ok(()) => {
                    republished += 1;
                    tracing::info!(
                        target: TRACING_TARGET_SWEEP,
                        job_id = %job.id,
                        "Stuck job re-published"
                    );
                }
                Err(err) => {
                    // Remaining jobs wait for the next tick; the queue is
                    // probably unavailable anyway.
                    tracing::error!(
                        target: TRACING_TARGET_SWEEP,
                        job_id = %job.id,
                        error = %err,
                        "Failed to re-publish stuck job"
                    );
                    break;
                }
            }
        }

        Ok(republished)
    }
}

impl std::fmt::Debug for ReconciliationSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationSweep")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
