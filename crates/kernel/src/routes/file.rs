//! File upload and download routes.
//!
//! Uploads are multipart; the MIME type is sniffed from content before the
//! allowlist check. Downloads are policy-gated: a private file answers 404
//! to anyone but its owner.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{Actor, PrivacyLevel, can_change_privacy, can_mutate};
use crate::error::{AppError, AppResult};
use crate::file::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE, StoredFile};
use crate::models::User;
use crate::routes::helpers::{Pagination, actor_can_read, current_actor, require_user};
use crate::state::AppState;

/// Create the file router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/files", get(list_files).post(upload_file))
        .route("/api/files/{id}", get(get_file).delete(delete_file))
        .route("/api/files/{id}/download", get(download_file))
        .route("/api/files/{id}/privacy", put(set_file_privacy))
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    #[serde(flatten)]
    pub file: StoredFile,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetPrivacyRequest {
    pub privacy_level: PrivacyLevel,
}

/// List the current user's files.
///
/// GET /api/files
async fn list_files(
    State(state): State<AppState>,
    session: Session,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<FileListResponse>> {
    let user_id = require_user(&session).await?;

    let (limit, offset) = pagination.limit_offset();
    let files = state.files().list_for_owner(user_id, limit, offset).await?;
    let total = state.files().count_for_owner(user_id).await?;

    let files = files
        .into_iter()
        .map(|file| {
            let url = state.files().public_url(&file);
            FileResponse { file, url }
        })
        .collect();

    Ok(Json(FileListResponse { files, total }))
}

/// Upload a file.
///
/// POST /api/files
/// Content-Type: multipart/form-data
///
/// Form fields:
/// - file: the file to upload
/// - privacy: optional privacy level; defaults to the uploader's file
///   privacy preference
async fn upload_file(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Json<FileResponse>> {
    let user_id = require_user(&session).await?;

    let mut filename: Option<String> = None;
    let mut declared_mime: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut privacy: Option<PrivacyLevel> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" if data.is_none() => {
                filename = field.file_name().map(|s| s.to_string());
                declared_mime = field.content_type().map(|s| s.to_string());

                let bytes = field.bytes().await.map_err(|e| {
                    warn!(error = %e, "failed to read upload data");
                    AppError::BadRequest("failed to read file data".to_string())
                })?;

                if bytes.len() > MAX_FILE_SIZE {
                    return Err(AppError::BadRequest(format!(
                        "file too large: {} bytes (max {} bytes)",
                        bytes.len(),
                        MAX_FILE_SIZE
                    )));
                }

                data = Some(bytes.to_vec());
            }
            "privacy" => {
                let text = field.text().await.map_err(|e| {
                    warn!(error = %e, "failed to read privacy field");
                    AppError::BadRequest("failed to read privacy field".to_string())
                })?;
                privacy = Some(
                    text.parse()
                        .map_err(|_| AppError::BadRequest(format!("unknown privacy level '{text}'")))?,
                );
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| AppError::BadRequest("no file provided".to_string()))?;
    let data = data.ok_or_else(|| AppError::BadRequest("no file provided".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("empty file".to_string()));
    }

    // Sniff the real content type; fall back to the client's declaration.
    let mime = match infer::get(&data) {
        Some(kind) => kind.mime_type().to_string(),
        None => declared_mime.unwrap_or_else(|| "application/octet-stream".to_string()),
    };

    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(AppError::BadRequest(format!("file type not allowed: {mime}")));
    }

    // Files default to the uploader's preference (private out of the box).
    let privacy = match privacy {
        Some(level) => level,
        None => {
            let user = User::find_by_id(state.db(), user_id)
                .await?
                .ok_or(AppError::Unauthorized)?;
            user.file_default_privacy
        }
    };

    let file = state
        .files()
        .upload(user_id, &filename, &mime, &data, privacy)
        .await?;

    info!(file_id = %file.id, filename = %file.filename, "file uploaded");

    let url = state.files().public_url(&file);
    Ok(Json(FileResponse { file, url }))
}

/// Load a file and enforce the read policy for the current actor.
async fn load_readable_file(
    state: &AppState,
    session: &Session,
    id: Uuid,
) -> AppResult<StoredFile> {
    let file = state.files().get(id).await?.ok_or(AppError::NotFound)?;

    let actor = current_actor(session).await;
    if !actor_can_read(state, &actor, &file).await? {
        return Err(AppError::NotFound);
    }

    Ok(file)
}

/// Get file metadata.
///
/// GET /api/files/{id}
async fn get_file(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FileResponse>> {
    let file = load_readable_file(&state, &session, id).await?;
    let url = state.files().public_url(&file);

    Ok(Json(FileResponse { file, url }))
}

/// Download a file's bytes.
///
/// GET /api/files/{id}/download
async fn download_file(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let file = load_readable_file(&state, &session, id).await?;
    let data = state.files().read(&file).await?;

    let headers = [
        (header::CONTENT_TYPE, file.mime.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename.replace('"', "")),
        ),
    ];

    Ok((headers, data).into_response())
}

/// Change a file's privacy level.
///
/// PUT /api/files/{id}/privacy
async fn set_file_privacy(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPrivacyRequest>,
) -> AppResult<Json<FileResponse>> {
    let user_id = require_user(&session).await?;

    let file = state.files().get(id).await?.ok_or(AppError::NotFound)?;

    if !can_change_privacy(&file, &Actor::Authenticated(user_id), request.privacy_level) {
        return Err(AppError::Forbidden);
    }

    let file = state
        .files()
        .set_privacy(file.id, request.privacy_level)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(file_id = %file.id, privacy = %file.privacy_level, "file privacy changed");

    let url = state.files().public_url(&file);
    Ok(Json(FileResponse { file, url }))
}

/// Delete a file and its stored bytes.
///
/// DELETE /api/files/{id}
async fn delete_file(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = require_user(&session).await?;

    let file = state.files().get(id).await?.ok_or(AppError::NotFound)?;

    if !can_mutate(&file, &Actor::Authenticated(user_id)) {
        return Err(AppError::Forbidden);
    }

    state.files().delete(&file).await?;

    info!(file_id = %file.id, "file deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
