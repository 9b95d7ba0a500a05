pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - errors, models and value objects
pub use domain::{
    ArchiveError, ArchiveResult, BucketName, ByteStream, DownloadedFile, DrainPolicy, DrainReport,
    MigrationReport, ObjectDownload, ObjectName, ObjectStat, ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{ArchiveService, ObjectStoreClient};

// Service implementations - business logic
pub use services::{ArchiveServiceBuilder, ArchiveServiceImpl, ServiceSettings};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, create_s3_app, AppBuilder, AppConfig,
    AppDependencies, AppError, AppServices, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    InMemoryObjectStoreClient, S3Config, S3ObjectStoreClient, StoreError,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, create_s3_app, AppBuilder, AppServices, ArchiveError,
        ArchiveService, ArchiveServiceImpl, BucketName, InMemoryObjectStoreClient, ObjectName,
        ObjectStoreClient, S3Config, S3ObjectStoreClient,
    };
}
