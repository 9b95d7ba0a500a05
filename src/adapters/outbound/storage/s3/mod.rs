//! S3 / MinIO object store client.
//!
//! Object reads and writes go through `object_store`'s `AmazonS3`, one
//! instance per bucket. Bucket management and server-side copies between
//! buckets are signed REST calls.

mod error_response;
mod s3_client;
mod signer;

pub use s3_client::S3ObjectStoreClient;

use std::time::Duration;

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone, bon::Builder)]
pub struct S3Config {
    /// Base URL such as `http://localhost:9000`
    #[builder(into)]
    pub endpoint: String,
    #[builder(into, default = String::from("us-east-1"))]
    pub region: String,
    #[builder(into)]
    pub access_key: String,
    #[builder(into)]
    pub secret_key: String,
    /// Permit plain `http://` endpoints
    #[builder(default)]
    pub allow_http: bool,
    pub request_timeout: Option<Duration>,
}
