use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use crate::{
    adapters::inbound::http::{
        dto::{
            api_error, bad_request, ApiError, CopyFileDto, DrainReportDto, MigrateBucketDto,
            MigrationReportDto, SuccessResponseDto,
        },
        router::AppState,
    },
    domain::{errors::ArchiveError, models::DEFAULT_CONTENT_TYPE},
};

/// Multipart field carrying the uploaded file
const UPLOAD_FIELD: &str = "file";

/// Liveness probe
pub async fn health() -> Json<SuccessResponseDto> {
    Json(SuccessResponseDto::new("ok"))
}

/// Handle bucket creation
pub async fn create_bucket(
    State(app_state): State<AppState>,
    Path(archive): Path<String>,
) -> Result<(StatusCode, Json<SuccessResponseDto>), ApiError> {
    let bucket = app_state
        .archive_service
        .create_bucket(&archive)
        .await
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponseDto::with_data(
            "Bucket created successfully",
            serde_json::json!({ "bucket": bucket.as_str() }),
        )),
    ))
}

/// Handle bucket deletion (files are removed first)
pub async fn delete_bucket(
    State(app_state): State<AppState>,
    Path(archive): Path<String>,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    let report = app_state
        .archive_service
        .delete_bucket(&archive)
        .await
        .map_err(api_error)?;

    Ok(Json(SuccessResponseDto::try_with_data(
        "Bucket deleted successfully",
        &DrainReportDto::from(report),
    )?))
}

/// Handle multipart file upload
pub async fn upload_file(
    State(app_state): State<AppState>,
    Path(archive): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request("Uploaded file has no file name"))?;
        let content_type = field.content_type().map(str::to_string);
        let body = field
            .map_err(|e| ArchiveError::ServiceError {
                message: format!("Upload body interrupted: {}", e.body_text()),
                status: Some(e.status().as_u16()),
            })
            .boxed();

        debug!(archive = %archive, file = %file_name, "Streaming upload");

        let size = app_state
            .archive_service
            .upload_stream(&archive, &file_name, body, content_type.as_deref())
            .await
            .map_err(api_error)?;

        return Ok(Json(SuccessResponseDto::with_data(
            "File uploaded successfully",
            serde_json::json!({ "file": file_name, "size": size }),
        )));
    }

    Err(bad_request(&format!(
        "Multipart field '{}' is missing",
        UPLOAD_FIELD
    )))
}

/// Handle file listing; returns a JSON array of file names
pub async fn list_files(
    State(app_state): State<AppState>,
    Path(archive): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = app_state
        .archive_service
        .list_files(&archive)
        .await
        .map_err(api_error)?;

    Ok(Json(names.into_iter().map(|n| n.to_string()).collect()))
}

/// Handle file download, streamed as an attachment
pub async fn download_file(
    State(app_state): State<AppState>,
    Path((archive, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let download = app_state
        .archive_service
        .download_stream(&archive, &file)
        .await
        .map_err(api_error)?;

    let content_type = download
        .stat
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, download.stat.size.to_string()),
        (header::CONTENT_DISPOSITION, attachment(&file)),
    ];

    Ok((headers, Body::from_stream(download.stream)).into_response())
}

/// Handle file deletion
pub async fn delete_file(
    State(app_state): State<AppState>,
    Path((archive, file)): Path<(String, String)>,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    app_state
        .archive_service
        .delete_file(&archive, &file)
        .await
        .map_err(api_error)?;

    Ok(Json(SuccessResponseDto::new("File deleted successfully")))
}

/// Handle file copy into another archive
pub async fn copy_file(
    State(app_state): State<AppState>,
    Path((archive, file)): Path<(String, String)>,
    Json(request): Json<CopyFileDto>,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    let target_file = request.target_file.as_deref().unwrap_or(&file);

    app_state
        .archive_service
        .copy_file(&archive, &file, &request.target_archive, target_file)
        .await
        .map_err(api_error)?;

    Ok(Json(SuccessResponseDto::new("File copied successfully")))
}

/// Handle bucket migration
pub async fn migrate_bucket(
    State(app_state): State<AppState>,
    Path(archive): Path<String>,
    Json(request): Json<MigrateBucketDto>,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    let report = app_state
        .archive_service
        .migrate_bucket(&archive, &request.target_archive)
        .await
        .map_err(api_error)?;

    Ok(Json(SuccessResponseDto::try_with_data(
        "Bucket migrated successfully",
        &MigrationReportDto::from(report),
    )?))
}

/// `Content-Disposition` for a download; non-ASCII names go in `filename*`
fn attachment(file: &str) -> String {
    let base = file.rsplit('/').next().unwrap_or(file);
    let ascii: String = base
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(base)
    )
}
