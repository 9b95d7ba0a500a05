use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{
    errors::ArchiveError,
    models::{DrainReport, MigrationReport},
};

/// Body of `POST /{archive}/{file}/copy`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileDto {
    pub target_archive: String,
    /// Defaults to the source file name
    pub target_file: Option<String>,
}

/// Body of `POST /{archive}/migrate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateBucketDto {
    pub target_archive: String,
}

/// DTO for a deleted bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainReportDto {
    pub bucket: String,
    pub removed: Vec<String>,
}

impl From<DrainReport> for DrainReportDto {
    fn from(report: DrainReport) -> Self {
        DrainReportDto {
            bucket: report.bucket.to_string(),
            removed: report.removed.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// DTO for a finished migration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReportDto {
    pub source: String,
    pub target: String,
    pub copied: Vec<String>,
}

impl From<MigrationReport> for MigrationReportDto {
    fn from(report: MigrationReport) -> Self {
        MigrationReportDto {
            source: report.source.to_string(),
            target: report.target.to_string(),
            copied: report.copied.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Error response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
}

/// Success response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponseDto {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponseDto>);

impl From<&ArchiveError> for StatusCode {
    fn from(error: &ArchiveError) -> Self {
        match error {
            ArchiveError::InvalidIdentifier { .. } | ArchiveError::InvalidFileName { .. } => {
                StatusCode::BAD_REQUEST
            }
            ArchiveError::BucketAlreadyExists { .. } | ArchiveError::BucketNotEmpty { .. } => {
                StatusCode::CONFLICT
            }
            ArchiveError::BucketNotFound { .. } | ArchiveError::FileNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ArchiveError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ArchiveError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
            ArchiveError::ServiceError {
                status: Some(_), ..
            } => StatusCode::BAD_GATEWAY,
            ArchiveError::ServiceError { status: None, .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_kind(error: &ArchiveError) -> &'static str {
    match error {
        ArchiveError::InvalidIdentifier { .. } => "InvalidIdentifier",
        ArchiveError::InvalidFileName { .. } => "InvalidFileName",
        ArchiveError::BucketAlreadyExists { .. } => "BucketAlreadyExists",
        ArchiveError::BucketNotFound { .. } => "BucketNotFound",
        ArchiveError::BucketNotEmpty { .. } => "BucketNotEmpty",
        ArchiveError::FileNotFound { .. } => "FileNotFound",
        ArchiveError::ServiceError { .. } => "ServiceError",
        ArchiveError::Cancelled { .. } => "Cancelled",
        ArchiveError::Timeout { .. } => "Timeout",
    }
}

impl ErrorResponseDto {
    pub fn from_archive_error(error: &ArchiveError) -> Self {
        let mut details = HashMap::new();

        match error {
            ArchiveError::InvalidIdentifier { identifier, .. } => {
                details.insert(
                    "identifier".to_string(),
                    serde_json::Value::String(identifier.clone()),
                );
            }
            ArchiveError::BucketAlreadyExists { bucket }
            | ArchiveError::BucketNotFound { bucket }
            | ArchiveError::BucketNotEmpty { bucket } => {
                details.insert(
                    "bucket".to_string(),
                    serde_json::Value::String(bucket.to_string()),
                );
            }
            ArchiveError::FileNotFound { bucket, name } => {
                details.insert(
                    "bucket".to_string(),
                    serde_json::Value::String(bucket.to_string()),
                );
                details.insert(
                    "file".to_string(),
                    serde_json::Value::String(name.to_string()),
                );
            }
            ArchiveError::ServiceError {
                status: Some(status),
                ..
            } => {
                details.insert(
                    "store_status".to_string(),
                    serde_json::Value::Number((*status).into()),
                );
            }
            _ => {}
        }

        ErrorResponseDto {
            error: error_kind(error).to_string(),
            message: error.to_string(),
            details: if details.is_empty() {
                None
            } else {
                Some(details)
            },
            timestamp: Utc::now(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        ErrorResponseDto {
            error: "BadRequest".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn internal(message: &str) -> Self {
        ErrorResponseDto {
            error: "InternalError".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }
}

impl SuccessResponseDto {
    pub fn new(message: &str) -> Self {
        SuccessResponseDto {
            message: message.to_string(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(message: &str, data: serde_json::Value) -> Self {
        SuccessResponseDto {
            message: message.to_string(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    /// Serialize `data` into the response; a failure becomes a 500
    pub fn try_with_data<T: Serialize>(message: &str, data: &T) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialize response data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponseDto::internal(&format!(
                    "Failed to serialize response: {}",
                    e
                ))),
            )
        })?;
        Ok(Self::with_data(message, data))
    }
}

/// Turn a service failure into a status code plus JSON body
pub fn api_error(error: ArchiveError) -> ApiError {
    (
        StatusCode::from(&error),
        Json(ErrorResponseDto::from_archive_error(&error)),
    )
}

pub fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponseDto::bad_request(message)),
    )
}
