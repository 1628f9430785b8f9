//! Forum topic routes.
//!
//! Reads go through the visibility policy; non-owners never learn whether a
//! hidden topic exists (denials answer 404). Mutations are owner-only.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::access::{PrivacyLevel, can_change_privacy, can_mutate};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTopic, Reply, Topic, UpdateTopic};
use crate::routes::helpers::{actor_can_read, current_actor, require_user};
use crate::state::AppState;

/// Create the topic router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/topics/{id}",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
        .route("/api/topics/{id}/privacy", put(set_topic_privacy))
}

/// Request body for creating a topic (posted to the category router).
#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub body: String,
    pub privacy_level: Option<PrivacyLevel>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTopicRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPrivacyRequest {
    pub privacy_level: PrivacyLevel,
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    #[serde(flatten)]
    pub topic: Topic,
    pub reply_count: i64,
}

/// Shared topic creation used by the category router.
pub(crate) async fn create_topic(
    state: &AppState,
    author_id: Uuid,
    category_id: Uuid,
    request: CreateTopicRequest,
) -> AppResult<Json<Topic>> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("topic title is required".to_string()));
    }

    if request.body.trim().is_empty() {
        return Err(AppError::BadRequest("topic body is required".to_string()));
    }

    let topic = Topic::create(
        state.db(),
        CreateTopic {
            category_id,
            author_id,
            title: request.title.trim().to_string(),
            body: request.body,
            privacy_level: request.privacy_level,
        },
    )
    .await?;

    info!(topic_id = %topic.id, "topic created");

    Ok(Json(topic))
}

/// Load a topic and enforce the read policy for the current actor.
pub(crate) async fn load_readable_topic(
    state: &AppState,
    session: &Session,
    id: Uuid,
) -> AppResult<Topic> {
    let topic = Topic::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    let actor = current_actor(session).await;
    if !actor_can_read(state, &actor, &topic).await? {
        // Hidden topics look like missing topics.
        return Err(AppError::NotFound);
    }

    Ok(topic)
}

/// Load a topic and require the current actor to own it.
async fn load_owned_topic(state: &AppState, session: &Session, id: Uuid) -> AppResult<Topic> {
    let user_id = require_user(session).await?;

    let topic = Topic::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !can_mutate(&topic, &crate::access::Actor::Authenticated(user_id)) {
        return Err(AppError::Forbidden);
    }

    Ok(topic)
}

/// Get a topic with its reply count.
///
/// GET /api/topics/{id}
async fn get_topic(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TopicResponse>> {
    let topic = load_readable_topic(&state, &session, id).await?;
    let reply_count = Reply::count_for_topic(state.db(), topic.id).await?;

    Ok(Json(TopicResponse { topic, reply_count }))
}

/// Update a topic's title/body.
///
/// PUT /api/topics/{id}
async fn update_topic(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTopicRequest>,
) -> AppResult<Json<Topic>> {
    let topic = load_owned_topic(&state, &session, id).await?;

    let topic = Topic::update(
        state.db(),
        topic.id,
        UpdateTopic {
            title: request.title,
            body: request.body,
        },
    )
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(topic))
}

/// Change a topic's privacy level.
///
/// PUT /api/topics/{id}/privacy
async fn set_topic_privacy(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPrivacyRequest>,
) -> AppResult<Json<Topic>> {
    let user_id = require_user(&session).await?;

    let topic = Topic::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    let actor = crate::access::Actor::Authenticated(user_id);
    if !can_change_privacy(&topic, &actor, request.privacy_level) {
        return Err(AppError::Forbidden);
    }

    let topic = Topic::set_privacy(state.db(), topic.id, request.privacy_level)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(topic_id = %topic.id, privacy = %topic.privacy_level, "topic privacy changed");

    Ok(Json(topic))
}

/// Delete a topic and its replies.
///
/// DELETE /api/topics/{id}
async fn delete_topic(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let topic = load_owned_topic(&state, &session, id).await?;

    if !Topic::delete(state.db(), topic.id).await? {
        return Err(AppError::NotFound);
    }

    info!(topic_id = %topic.id, "topic deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
