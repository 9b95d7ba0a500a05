use std::time::Duration;

use crate::domain::{
    errors::ValidationError,
    value_objects::{BucketName, ObjectName},
};

/// Errors that can occur while managing archive buckets and their files
#[derive(Debug, Clone)]
pub enum ArchiveError {
    /// The archive identifier cannot be turned into a valid bucket name
    InvalidIdentifier {
        identifier: String,
        reason: ValidationError,
    },

    /// The file name is not a valid object name
    InvalidFileName {
        name: String,
        reason: ValidationError,
    },

    /// Create requested on a bucket that is already present
    BucketAlreadyExists { bucket: BucketName },

    /// Operation requires a bucket that is absent
    BucketNotFound { bucket: BucketName },

    /// The store refused to remove a bucket that still holds objects
    BucketNotEmpty { bucket: BucketName },

    /// Operation requires a file that is absent
    FileNotFound { bucket: BucketName, name: ObjectName },

    /// Transport or infrastructure failure reported by the object store
    ServiceError {
        message: String,
        /// HTTP status returned by the remote store, if it answered at all
        status: Option<u16>,
    },

    /// Operation aborted through its cancellation token
    Cancelled { operation: &'static str },

    /// Operation exceeded its deadline
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl ArchiveError {
    /// Shorthand for a store failure without a remote status
    pub fn service(message: impl Into<String>) -> Self {
        ArchiveError::ServiceError {
            message: message.into(),
            status: None,
        }
    }

    /// True for the "not found" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ArchiveError::BucketNotFound { .. } | ArchiveError::FileNotFound { .. }
        )
    }
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::InvalidIdentifier { identifier, reason } => {
                write!(f, "Invalid archive identifier '{}': {}", identifier, reason)
            }
            ArchiveError::InvalidFileName { name, reason } => {
                write!(f, "Invalid file name '{}': {}", name, reason)
            }
            ArchiveError::BucketAlreadyExists { bucket } => {
                write!(f, "Bucket already exists: {}", bucket)
            }
            ArchiveError::BucketNotFound { bucket } => {
                write!(f, "Bucket does not exist: {}", bucket)
            }
            ArchiveError::BucketNotEmpty { bucket } => {
                write!(f, "Bucket is not empty: {}", bucket)
            }
            ArchiveError::FileNotFound { bucket, name } => {
                write!(f, "File '{}' not found in bucket {}", name, bucket)
            }
            ArchiveError::ServiceError { message, status } => match status {
                Some(status) => write!(f, "Object store error ({}): {}", status, message),
                None => write!(f, "Object store error: {}", message),
            },
            ArchiveError::Cancelled { operation } => {
                write!(f, "Operation '{}' was cancelled", operation)
            }
            ArchiveError::Timeout { operation, after } => {
                write!(
                    f,
                    "Operation '{}' timed out after {} ms",
                    operation,
                    after.as_millis()
                )
            }
        }
    }
}

impl std::error::Error for ArchiveError {}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
