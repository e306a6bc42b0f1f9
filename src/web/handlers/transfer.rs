//! Transfer handlers for the Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;
use utoipa;

use crate::transfer::IncomingFile;
use crate::web::dto::{GroupInfoResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Multipart field name carrying the uploaded files.
const UPLOAD_FIELD: &str = "files";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// This function sanitizes the filename to prevent header injection attacks
/// and uses RFC 5987 encoding for non-ASCII filenames.
///
/// # Security
///
/// The function:
/// - Removes control characters (including CR, LF which could cause header injection)
/// - Escapes double quotes and backslashes
/// - Uses RFC 5987 filename* parameter for proper Unicode support
fn content_disposition_header(filename: &str) -> String {
    // Sanitize filename for the basic filename parameter (ASCII fallback)
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control()) // Remove control characters (CR, LF, etc.)
        .map(|c| match c {
            '"' => '_',  // Replace double quotes
            '\\' => '_', // Replace backslashes
            _ => c,
        })
        .collect();

    // For ASCII-only filenames, use simple format
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    // Use RFC 5987 encoding for non-ASCII or special characters
    // filename* parameter with UTF-8 encoding
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/upload - Upload one or more files and receive a share code.
///
/// Request body: multipart/form-data with one or more "files" fields.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "transfer",
    responses(
        (status = 200, description = "Files stored, group registered", body = UploadResponse),
        (status = 400, description = "No files in request or upload too large"),
        (status = 503, description = "Store cannot accept new groups right now")
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files: Vec<IncomingFile> = Vec::new();
    let mut total_bytes: usize = 0;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // Text parts carry no filename and are not files
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let content = field
            .bytes()
            .await
            .map_err(|e| {
                tracing::error!("Failed to read file content: {}", e);
                ApiError::bad_request("Failed to read file")
            })?
            .to_vec();

        total_bytes += content.len();
        if total_bytes > state.max_upload_size {
            let max_mb = state.max_upload_size / 1024 / 1024;
            return Err(ApiError::bad_request(format!(
                "Upload too large (max {max_mb}MB)"
            )));
        }

        files.push(IncomingFile::new(file_name, content_type, content));
    }

    let code = state.transfers.store_group(files)?;

    Ok(Json(UploadResponse {
        code: code.to_string(),
    }))
}

/// GET /api/info/:code - List the files behind a share code.
#[utoipa::path(
    get,
    path = "/api/info/{code}",
    tag = "transfer",
    params(
        ("code" = String, Path, description = "Share code (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Files in the group", body = GroupInfoResponse),
        (status = 404, description = "Unknown code"),
        (status = 410, description = "Group expired")
    )
)]
pub async fn group_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<GroupInfoResponse>, ApiError> {
    let group = state.transfers.group_info(&code)?;
    Ok(Json(GroupInfoResponse::from(&group)))
}

/// GET /api/download/:code - Group listing under the download path.
///
/// Clients that were built against the two-step flow fetch this listing
/// first and then request each file by its download id.
#[utoipa::path(
    get,
    path = "/api/download/{code}",
    tag = "transfer",
    params(
        ("code" = String, Path, description = "Share code (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Files in the group", body = GroupInfoResponse),
        (status = 404, description = "Unknown code"),
        (status = 410, description = "Group expired")
    )
)]
pub async fn list_group(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<GroupInfoResponse>, ApiError> {
    let group = state.transfers.group_info(&code)?;
    Ok(Json(GroupInfoResponse::from(&group)))
}

/// GET /api/download/:code/:file_id - Download one file of a group.
#[utoipa::path(
    get,
    path = "/api/download/{code}/{file_id}",
    tag = "transfer",
    params(
        ("code" = String, Path, description = "Share code (case-insensitive)"),
        ("file_id" = String, Path, description = "Download id from the listing")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown code or file"),
        (status = 410, description = "Group expired")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((code, file_id)): Path<(String, String)>,
) -> Result<Response<Body>, ApiError> {
    let (file, content) = state.transfers.open_file(&code, &file_id)?;

    // Prefer the declared type; guess from the name when none was declared
    let content_type = if file.content_type.is_empty() {
        mime_guess::from_path(&file.display_name)
            .first_or_octet_stream()
            .to_string()
    } else {
        file.content_type.clone()
    };

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.display_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}
