//! Role runtimes: gateway state and worker pool.

use anyhow::Context;
use fisco_nats::NatsClient;
use fisco_nats::queue::OcrQueue;
use fisco_opendal::StorageBackend;
use fisco_postgres::{PgClient, run_pending_migrations};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;
use crate::{TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};

/// Shared handles both roles need.
struct PipelineState {
    pg: PgClient,
    queue: OcrQueue,
    storage: StorageBackend,
}

/// Connects to all external services and applies pending migrations.
async fn connect(cli: &Cli) -> anyhow::Result<PipelineState> {
    let pg = cli
        .postgres
        .clone()
        .build()
        .context("failed to create job store client")?;

    let applied = run_pending_migrations(&pg)
        .await
        .context("failed to apply migrations")?;
    if !applied.is_empty() {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            count = applied.len(),
            "Applied pending migrations"
        );
    }

    cli.nats
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid NATS configuration")?;
    let nats = NatsClient::connect(cli.nats.clone())
        .await
        .context("failed to connect to NATS")?;
    let queue = nats
        .ocr_queue()
        .await
        .context("failed to initialize the job queue")?;

    let storage = StorageBackend::new(cli.storage.to_storage_config()?)
        .context("failed to initialize blob storage")?;

    Ok(PipelineState { pg, queue, storage })
}

/// Runs the gateway state: migrations plus the reconciliation sweep.
///
/// The submission service itself is a library type an HTTP layer embeds;
/// this process keeps the pipeline healthy around it.
pub async fn run_gateway(cli: Cli) -> anyhow::Result<()> {
    let state = connect(&cli).await?;
    let cancel_token = CancellationToken::new();

    let sweep = fisco_gateway::ReconciliationSweep::new(
        state.pg,
        state.queue,
        cli.gateway,
        cancel_token.clone(),
    );
    let handle = sweep.spawn();

    // Exercised here so a broken storage configuration fails at startup
    // instead of on the first upload.
    state
        .storage
        .exists("documents/")
        .await
        .context("blob storage probe failed")?;

    shutdown_signal().await;
    cancel_token.cancel();

    handle
        .await
        .context("sweep task panicked")?
        .context("sweep task failed")?;

    Ok(())
}

/// Runs the worker pool until interrupted.
pub async fn run_workers(cli: Cli) -> anyhow::Result<()> {
    #[cfg(not(feature = "mock"))]
    {
        let _ = cli;
        anyhow::bail!("no extraction backend compiled in; rebuild with --features mock");
    }

    #[cfg(feature = "mock")]
    {
        use std::sync::Arc;

        use fisco_billing::{BillingProvider, HttpBillingClient};
        use fisco_core::extract::ExtractService;
        use fisco_core::mock::MockExtractor;
        use fisco_worker::ExtractionWorker;

        let state = connect(&cli).await?;
        let cancel_token = CancellationToken::new();

        let extractor = ExtractService::new(MockExtractor::default())
            .with_retry_policy(cli.worker.worker_extract_attempts)
            .with_timeout(cli.worker.extract_timeout())
            .with_logging(true)
            .with_service_name("mock-extractor");

        let billing: Option<Arc<dyn BillingProvider>> = if cli.worker.billing_enabled() {
            let client = HttpBillingClient::new(cli.billing.clone())
                .context("billing is enabled but the ledger client could not be created")?;
            Some(Arc::new(client))
        } else {
            None
        };

        let mut handles = Vec::with_capacity(cli.worker.worker_concurrency);
        for _ in 0..cli.worker.worker_concurrency {
            let mut worker = ExtractionWorker::new(
                state.pg.clone(),
                state.storage.clone(),
                state.queue.clone(),
                extractor.clone(),
                cli.worker.clone(),
                cancel_token.clone(),
            );
            if let Some(billing) = &billing {
                worker = worker.with_billing(billing.clone());
            }
            handles.push(worker.spawn());
        }

        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            workers = handles.len(),
            "Worker pool started"
        );

        shutdown_signal().await;
        cancel_token.cancel();

        for handle in handles {
            handle
                .await
                .context("worker task panicked")?
                .context("worker task failed")?;
        }

        Ok(())
    }
}

/// Waits for SIGINT.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %err,
            "Failed to listen for shutdown signal"
        );
        return;
    }

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        "Shutdown signal received"
    );
}
