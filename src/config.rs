//! Command-line and environment settings shared by the server and the CLI.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    adapters::outbound::storage::S3Config,
    app::{AppConfig, StorageBackend},
    domain::models::DrainPolicy,
    services::ServiceSettings,
};

/// Storage and service options
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Storage backend type (memory, s3, minio)
    #[arg(long, env = "STORAGE_BACKEND", default_value = "memory")]
    pub storage_backend: String,

    /// S3 endpoint URL (for S3/MinIO backends)
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    /// Allow plain HTTP endpoints
    #[arg(long, env = "S3_ALLOW_HTTP", default_value = "false")]
    pub s3_allow_http: bool,

    /// Deadline for one archive operation, in seconds
    #[arg(long, env = "ARCHIVE_OPERATION_TIMEOUT_SECS")]
    pub operation_timeout_secs: Option<u64>,

    /// What to do when deleting one file fails while deleting a bucket
    #[arg(long, env = "ARCHIVE_DRAIN_POLICY", default_value = "fail-fast")]
    pub drain_policy: DrainPolicy,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl StoreArgs {
    pub fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend.as_str() {
            "memory" | "in-memory" => StorageBackend::InMemory,
            "s3" | "minio" => {
                let endpoint = self
                    .s3_endpoint
                    .clone()
                    .context("S3_ENDPOINT is required for the S3 backend")?;
                let access_key = self
                    .s3_access_key
                    .clone()
                    .context("S3_ACCESS_KEY is required for the S3 backend")?;
                let secret_key = self
                    .s3_secret_key
                    .clone()
                    .context("S3_SECRET_KEY is required for the S3 backend")?;

                StorageBackend::S3(
                    S3Config::builder()
                        .endpoint(endpoint)
                        .region(self.s3_region.clone())
                        .access_key(access_key)
                        .secret_key(secret_key)
                        .allow_http(self.s3_allow_http)
                        .build(),
                )
            }
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        Ok(AppConfig {
            storage_backend,
            service: ServiceSettings {
                operation_timeout: self.operation_timeout_secs.map(Duration::from_secs),
                drain_policy: self.drain_policy,
            },
        })
    }

    /// Install the global tracing subscriber. `RUST_LOG` wins over `--log-level`.
    pub fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .context("Invalid log level")?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(())
    }
}
