// Infrastructure error types
pub mod error;

// Shared object-level helpers over object_store
mod object_ops;

// Client implementations
pub mod in_memory_client;
pub mod s3;

pub use error::StoreError;
pub use in_memory_client::InMemoryObjectStoreClient;
pub use s3::{S3Config, S3ObjectStoreClient};
