//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{FileEntry, GroupInfoResponse, UploadResponse};
use super::handlers::{self, AppState};
use super::middleware::create_cors_layer;

/// Headroom on top of the configured upload cap for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    // Axum caps request bodies at 2MB by default; the multipart upload
    // needs the configured cap plus room for the multipart framing.
    let body_limit = app_state.max_upload_size + MULTIPART_OVERHEAD;

    // Transfer routes
    let api_routes = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/info/:code", get(handlers::group_info))
        .route("/download/:code", get(handlers::list_group))
        .route("/download/:code/:file_id", get(handlers::download_file));

    // Build the main router with middleware
    Router::new()
        .route("/", get(banner))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            handlers::transfer::upload,
            handlers::transfer::group_info,
            handlers::transfer::list_group,
            handlers::transfer::download_file,
        ),
        components(schemas(UploadResponse, GroupInfoResponse, FileEntry)),
        tags(
            (name = "transfer", description = "Upload files, share the code, download before expiry")
        )
    )]
    struct ApiDoc;

    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Service banner handler.
async fn banner() -> &'static str {
    "chute is running"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BlobStore;
    use crate::transfer::{GroupRegistry, TransferService};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }

    #[test]
    fn test_create_swagger_router() {
        let _router = create_swagger_router();
        // Should not panic
    }

    #[test]
    fn test_create_router() {
        let dir = TempDir::new().unwrap();
        let blobs = BlobStore::new(dir.path().join("blobs")).unwrap();
        let registry = GroupRegistry::new(Duration::from_secs(60), 0);
        let service = Arc::new(TransferService::new(registry, blobs));
        let state = Arc::new(AppState::new(service, 1024 * 1024));

        let _router = create_router(state, &[]);
        // Should not panic
    }
}
