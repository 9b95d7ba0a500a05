use object_store::path::Path as ObjectPath;
use thiserror::Error as ThisError;

use crate::domain::{
    errors::{ArchiveError, ArchiveResult, ValidationError},
    value_objects::{BucketName, ObjectName},
};

/// Infrastructure failures raised inside the storage adapters
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("S3 error {status} {code}: {message}")]
    S3 {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Malformed S3 response: {0}")]
    Xml(String),

    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("Store returned an unusable object name '{path}': {reason}")]
    InvalidObjectPath { path: String, reason: String },
}

/// Anything not mapped to a specific archive error is a service failure
impl From<StoreError> for ArchiveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::S3 {
                status,
                code,
                message,
            } => ArchiveError::ServiceError {
                message: format!("{}: {}", code, message),
                status: Some(status),
            },
            StoreError::Http(e) => ArchiveError::ServiceError {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            other => ArchiveError::service(other.to_string()),
        }
    }
}

/// Map an object-level failure, turning "not found" into `FileNotFound`
pub(crate) fn object_error(
    err: object_store::Error,
    bucket: &BucketName,
    name: &ObjectName,
) -> ArchiveError {
    match err {
        object_store::Error::NotFound { .. } => ArchiveError::FileNotFound {
            bucket: bucket.clone(),
            name: name.clone(),
        },
        other => StoreError::ObjectStore(other).into(),
    }
}

/// Object store location for a file name.
///
/// The key is the name itself: `Path::parse` keeps reserved characters as
/// they are, so objects written by other S3 clients are addressed by the
/// names they list under.
pub(crate) fn object_path(name: &ObjectName) -> ArchiveResult<ObjectPath> {
    ObjectPath::parse(name.as_str()).map_err(|e| ArchiveError::InvalidFileName {
        name: name.to_string(),
        reason: ValidationError::ObjectNameNotAStoreKey(e.to_string()),
    })
}

/// Recover the file name from a listed store location
pub(crate) fn object_name_from_path(path: &ObjectPath) -> Result<ObjectName, StoreError> {
    ObjectName::new(path.as_ref().to_string()).map_err(|e| StoreError::InvalidObjectPath {
        path: path.as_ref().to_string(),
        reason: e.to_string(),
    })
}
