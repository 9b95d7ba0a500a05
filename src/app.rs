use std::{sync::Arc, time::Duration};

use crate::{
    adapters::outbound::storage::{InMemoryObjectStoreClient, S3Config, S3ObjectStoreClient},
    domain::models::DrainPolicy,
    ports::storage::ObjectStoreClient,
    services::{ArchiveServiceBuilder, ArchiveServiceImpl, ServiceSettings},
};

/// Configuration for the application
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub service: ServiceSettings,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    #[default]
    InMemory,
    /// Any S3-compatible endpoint, MinIO included
    S3(S3Config),
}

/// Application dependencies container
pub struct AppDependencies {
    pub client: Arc<dyn ObjectStoreClient>,
}

/// Application services container
pub struct AppServices {
    pub archive_service: ArchiveServiceImpl,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.service.operation_timeout = Some(timeout);
        self
    }

    pub fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.config.service.drain_policy = policy;
        self
    }

    /// Build the application dependencies
    pub async fn build_dependencies(&self) -> Result<AppDependencies, AppError> {
        let client: Arc<dyn ObjectStoreClient> = match &self.config.storage_backend {
            StorageBackend::InMemory => Arc::new(InMemoryObjectStoreClient::new()),
            StorageBackend::S3(config) => {
                let client = S3ObjectStoreClient::new(config.clone()).map_err(|e| {
                    AppError::StorageInit {
                        message: e.to_string(),
                    }
                })?;
                Arc::new(client)
            }
        };

        Ok(AppDependencies { client })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let deps = self.build_dependencies().await?;

        let mut builder = ArchiveServiceBuilder::new()
            .client(deps.client)
            .drain_policy(self.config.service.drain_policy);
        if let Some(timeout) = self.config.service.operation_timeout {
            builder = builder.operation_timeout(timeout);
        }

        let archive_service = builder.build().map_err(|e| AppError::ServiceInit {
            message: e.to_string(),
        })?;

        Ok(AppServices { archive_service })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Service initialization error: {message}")]
    ServiceInit { message: String },
}

/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

/// Create an application backed by an S3-compatible store
pub async fn create_s3_app(config: S3Config) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(config))
        .build()
        .await
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    let config = config_from_lookup(|key| std::env::var(key).ok())?;
    AppBuilder::new().with_config(config).build().await
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key).ok_or_else(|| AppError::Configuration {
        message: format!("{} environment variable required", key),
    })
}

/// Read the application configuration through `lookup` (normally the process
/// environment)
pub fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, AppError> {
    let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
        None | Some("memory") | Some("in-memory") => StorageBackend::InMemory,
        Some("s3") | Some("minio") => {
            let allow_http = lookup("S3_ALLOW_HTTP")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false);

            StorageBackend::S3(
                S3Config::builder()
                    .endpoint(required(&lookup, "S3_ENDPOINT")?)
                    .region(lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()))
                    .access_key(required(&lookup, "S3_ACCESS_KEY")?)
                    .secret_key(required(&lookup, "S3_SECRET_KEY")?)
                    .allow_http(allow_http)
                    .build(),
            )
        }
        Some(other) => {
            return Err(AppError::Configuration {
                message: format!("Unknown storage backend: {}", other),
            })
        }
    };

    let operation_timeout = lookup("ARCHIVE_OPERATION_TIMEOUT_SECS")
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| AppError::Configuration {
                    message: format!("ARCHIVE_OPERATION_TIMEOUT_SECS '{}': {}", v, e),
                })
        })
        .transpose()?;

    let drain_policy = lookup("ARCHIVE_DRAIN_POLICY")
        .map(|v| v.parse::<DrainPolicy>())
        .transpose()
        .map_err(|message| AppError::Configuration { message })?
        .unwrap_or_default();

    Ok(AppConfig {
        storage_backend,
        service: ServiceSettings {
            operation_timeout,
            drain_policy,
        },
    })
}
