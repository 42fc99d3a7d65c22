//! Storage configuration types.

use serde::{Deserialize, Serialize};

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum BackendType {
    /// Amazon S3 compatible storage (AWS, MinIO, Oracle OCI).
    S3,
    /// Google Cloud Storage.
    Gcs,
    /// Azure Blob Storage.
    AzureBlob,
    /// Local filesystem, for development deployments.
    Fs,
    /// In-memory store, for tests only.
    Memory,
}

impl BackendType {
    /// Returns the backend name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::AzureBlob => "azblob",
            Self::Fs => "fs",
            Self::Memory => "memory",
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use.
    pub backend_type: BackendType,
    /// Bucket name (s3/gcs/azblob container) or root directory (fs).
    pub root: String,
    /// Region, for S3 compatible backends.
    pub region: Option<String>,
    /// Custom endpoint, for S3 compatible backends.
    pub endpoint: Option<String>,
    /// Access key ID.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
    /// Account name, for Azure Blob.
    pub account_name: Option<String>,
    /// Account key, for Azure Blob.
    pub account_key: Option<String>,
}

impl StorageConfig {
    /// Creates a configuration for the in-memory backend.
    pub fn memory() -> Self {
        Self::bare(BackendType::Memory, "/")
    }

    /// Creates a configuration for a local filesystem root.
    pub fn fs(root: impl Into<String>) -> Self {
        Self::bare(BackendType::Fs, root)
    }

    /// Creates a configuration for an S3 compatible bucket.
    pub fn s3(bucket: impl Into<String>) -> Self {
        Self::bare(BackendType::S3, bucket)
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    fn bare(backend_type: BackendType, root: impl Into<String>) -> Self {
        Self {
            backend_type,
            root: root.into(),
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            account_name: None,
            account_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_s3_fields() {
        let config = StorageConfig::s3("uploads")
            .with_region("sa-east-1")
            .with_endpoint("http://localhost:9000")
            .with_credentials("key", "secret");

        assert_eq!(config.backend_type, BackendType::S3);
        assert_eq!(config.root, "uploads");
        assert_eq!(config.region.as_deref(), Some("sa-east-1"));
        assert_eq!(config.access_key_id.as_deref(), Some("key"));
    }
}
