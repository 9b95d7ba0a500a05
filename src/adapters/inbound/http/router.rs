use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    copy_file, create_bucket, delete_bucket, delete_file, download_file, health, list_files,
    migrate_bucket, upload_file,
};
use crate::ports::services::ArchiveService;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub archive_service: Arc<dyn ArchiveService>,
}

/// Create the main application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Bucket operations
        .route("/{archive}/createBucket", post(create_bucket))
        .route("/{archive}/deleteBucket", delete(delete_bucket))
        .route("/{archive}/migrate", post(migrate_bucket))
        // File operations
        .route("/{archive}/upload", post(upload_file))
        .route("/{archive}/list", get(list_files))
        .route("/{archive}/{file}/download", get(download_file))
        .route("/{archive}/{file}/delete", delete(delete_file))
        .route("/{archive}/{file}/copy", post(copy_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::storage::InMemoryObjectStoreClient, services::ArchiveServiceImpl,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn test_server() -> TestServer {
        let client = Arc::new(InMemoryObjectStoreClient::new());
        let state = AppState {
            archive_service: Arc::new(ArchiveServiceImpl::new(client)),
        };
        TestServer::new(create_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = test_server();
        server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_create_bucket_route() {
        let server = test_server();

        let response = server.post("/AB-2023%2F17/createBucket").await;
        response.assert_status(StatusCode::CREATED);

        let names: Vec<String> = server.get("/ab-2023-17/list").await.json();
        assert!(names.is_empty());
    }
}
