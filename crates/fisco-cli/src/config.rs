//! CLI configuration.
//!
//! All options can be provided as CLI arguments or environment variables:
//!
//! ```bash
//! fisco --postgres-url "postgresql://..." --nats-url nats://127.0.0.1:4222 \
//!       --nats-token secret worker
//! POSTGRES_URL="postgresql://..." NATS_URL=... NATS_TOKEN=... fisco gateway
//! ```

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use fisco_billing::BillingConfig;
use fisco_gateway::GatewayConfig;
use fisco_nats::NatsConfig;
use fisco_opendal::{BackendType, StorageConfig};
use fisco_postgres::PgConfig;
use fisco_worker::WorkerConfig;
use serde::{Deserialize, Serialize};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "fisco")]
#[command(about = "Fisco document processing pipeline")]
#[command(version)]
pub struct Cli {
    /// Which role this process runs.
    #[command(subcommand)]
    pub command: Command,

    /// Job store connection configuration.
    #[clap(flatten)]
    pub postgres: PgConfig,

    /// Durable queue connection configuration.
    #[clap(flatten)]
    pub nats: NatsConfig,

    /// Blob storage configuration.
    #[clap(flatten)]
    pub storage: StorageCliConfig,

    /// Submission gateway and reconciliation sweep configuration.
    #[clap(flatten)]
    pub gateway: GatewayConfig,

    /// Worker pool configuration.
    #[clap(flatten)]
    pub worker: WorkerConfig,

    /// Billing ledger configuration.
    #[clap(flatten)]
    pub billing: BillingConfig,
}

/// Process role.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the submission gateway state: migrations and the
    /// stuck-pending reconciliation sweep.
    Gateway,
    /// Run a pool of extraction workers.
    Worker,
}

/// Blob storage options, mapped onto [`StorageConfig`].
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct StorageCliConfig {
    /// Storage backend: fs, s3, gcs, azblob or memory
    #[arg(
        long = "storage-backend",
        env = "STORAGE_BACKEND",
        default_value = "fs"
    )]
    pub storage_backend: String,

    /// Bucket name (s3/gcs/azblob) or root directory (fs)
    #[arg(
        long = "storage-root",
        env = "STORAGE_ROOT",
        default_value = "./data/documents"
    )]
    pub storage_root: String,

    /// Region, for S3 compatible backends
    #[arg(long = "storage-region", env = "STORAGE_REGION")]
    pub storage_region: Option<String>,

    /// Custom endpoint, for S3 compatible backends
    #[arg(long = "storage-endpoint", env = "STORAGE_ENDPOINT")]
    pub storage_endpoint: Option<String>,

    /// Access key ID
    #[arg(long = "storage-access-key-id", env = "STORAGE_ACCESS_KEY_ID")]
    pub storage_access_key_id: Option<String>,

    /// Secret access key
    #[arg(
        long = "storage-secret-access-key",
        env = "STORAGE_SECRET_ACCESS_KEY"
    )]
    pub storage_secret_access_key: Option<String>,
}

impl StorageCliConfig {
    /// Builds the storage configuration from the CLI options.
    pub fn to_storage_config(&self) -> anyhow::Result<StorageConfig> {
        let backend_type = match self.storage_backend.as_str() {
            "fs" => BackendType::Fs,
            "s3" => BackendType::S3,
            "gcs" => BackendType::Gcs,
            "azblob" => BackendType::AzureBlob,
            "memory" => BackendType::Memory,
            other => bail!("unknown storage backend: {other}"),
        };

        let mut config = StorageConfig {
            backend_type,
            root: self.storage_root.clone(),
            region: self.storage_region.clone(),
            endpoint: self.storage_endpoint.clone(),
            access_key_id: self.storage_access_key_id.clone(),
            secret_access_key: self.storage_secret_access_key.clone(),
            account_name: None,
            account_key: None,
        };

        if backend_type == BackendType::Memory {
            config = StorageConfig::memory();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(backend: &str) -> StorageCliConfig {
        StorageCliConfig {
            storage_backend: backend.to_string(),
            storage_root: "uploads".to_string(),
            storage_region: None,
            storage_endpoint: None,
            storage_access_key_id: None,
            storage_secret_access_key: None,
        }
    }

    #[test]
    fn maps_backend_names() {
        assert_eq!(
            storage("s3").to_storage_config().unwrap().backend_type,
            BackendType::S3
        );
        assert_eq!(
            storage("fs").to_storage_config().unwrap().backend_type,
            BackendType::Fs
        );
        assert!(storage("ftp").to_storage_config().is_err());
    }

    #[test]
    fn cli_parses_worker_command() {
        let cli = Cli::parse_from([
            "fisco",
            "--postgres-url",
            "postgresql://localhost/fisco",
            "--nats-url",
            "nats://127.0.0.1:4222",
            "--nats-token",
            "secret",
            "worker",
        ]);

        assert!(matches!(cli.command, Command::Worker));
        assert_eq!(cli.worker.worker_concurrency, 4);
    }
}
