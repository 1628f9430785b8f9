//! Topic reply routes.
//!
//! Reply visibility follows the parent topic; mutation is author-only.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateReply, Reply};
use crate::routes::helpers::{Pagination, require_user};
use crate::routes::topic::load_readable_topic;
use crate::state::AppState;

/// Create the reply router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/topics/{id}/replies",
            get(list_replies).post(create_reply),
        )
        .route("/api/replies/{id}", put(update_reply).delete(delete_reply))
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReplyRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyListResponse {
    pub replies: Vec<Reply>,
    pub total: i64,
}

/// List replies on a topic in posting order.
///
/// GET /api/topics/{id}/replies
async fn list_replies(
    State(state): State<AppState>,
    session: Session,
    Path(topic_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ReplyListResponse>> {
    let topic = load_readable_topic(&state, &session, topic_id).await?;

    let (limit, offset) = pagination.limit_offset();
    let replies = Reply::list_for_topic(state.db(), topic.id, limit, offset).await?;
    let total = Reply::count_for_topic(state.db(), topic.id).await?;

    Ok(Json(ReplyListResponse { replies, total }))
}

/// Post a reply to a topic.
///
/// POST /api/topics/{id}/replies
async fn create_reply(
    State(state): State<AppState>,
    session: Session,
    Path(topic_id): Path<Uuid>,
    Json(request): Json<CreateReplyRequest>,
) -> AppResult<Json<Reply>> {
    let user_id = require_user(&session).await?;

    // Posting requires the topic to be readable by the poster.
    let topic = load_readable_topic(&state, &session, topic_id).await?;

    if request.body.trim().is_empty() {
        return Err(AppError::BadRequest("reply body is required".to_string()));
    }

    let reply = Reply::create(
        state.db(),
        CreateReply {
            topic_id: topic.id,
            author_id: user_id,
            body: request.body,
        },
    )
    .await?;

    info!(reply_id = %reply.id, topic_id = %topic.id, "reply created");

    Ok(Json(reply))
}

/// Load a reply and require the current actor to be its author.
async fn load_own_reply(state: &AppState, session: &Session, id: Uuid) -> AppResult<Reply> {
    let user_id = require_user(session).await?;

    let reply = Reply::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if reply.author_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(reply)
}

/// Edit a reply.
///
/// PUT /api/replies/{id}
async fn update_reply(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReplyRequest>,
) -> AppResult<Json<Reply>> {
    let reply = load_own_reply(&state, &session, id).await?;

    if request.body.trim().is_empty() {
        return Err(AppError::BadRequest("reply body is required".to_string()));
    }

    let reply = Reply::update(state.db(), reply.id, &request.body)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(reply))
}

/// Delete a reply.
///
/// DELETE /api/replies/{id}
async fn delete_reply(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let reply = load_own_reply(&state, &session, id).await?;

    if !Reply::delete(state.db(), reply.id).await? {
        return Err(AppError::NotFound);
    }

    info!(reply_id = %reply.id, "reply deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
