//! User profile and follow routes.
//!
//! A profile's `privacy_level` controls how much of it non-owners see: a
//! hidden profile still resolves (usernames are public) but only exposes
//! its name and follower counts.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Follow, ProfileRef, Topic, UpdateProfile, User};
use crate::routes::helpers::{
    Pagination, actor_can_read, current_actor, filter_readable, require_user,
};
use crate::state::AppState;

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profile", put(update_own_profile))
        .route("/api/users/{name}", get(get_profile))
        .route(
            "/api/users/{name}/follow",
            post(follow_user).delete(unfollow_user),
        )
        .route("/api/users/{name}/followers", get(list_followers))
        .route("/api/users/{name}/following", get(list_following))
        .route("/api/users/{name}/topics", get(list_user_topics))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    /// Absent when the profile is hidden from the viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    pub follower_count: i64,
    pub following_count: i64,
    /// Whether the current viewer follows this user.
    pub is_following: bool,
    /// Whether the viewer saw the full profile.
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub users: Vec<ProfileRef>,
}

#[derive(Debug, Serialize)]
pub struct UserTopicsResponse {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub privacy_level: Option<crate::access::PrivacyLevel>,
    pub blog_default_privacy: Option<crate::access::PrivacyLevel>,
    pub file_default_privacy: Option<crate::access::PrivacyLevel>,
}

async fn find_user(state: &AppState, name: &str) -> AppResult<User> {
    User::find_by_name(state.db(), name)
        .await?
        .ok_or(AppError::NotFound)
}

/// Get a user profile.
///
/// GET /api/users/{name}
async fn get_profile(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let user = find_user(&state, &name).await?;
    let actor = current_actor(&session).await;

    let follower_count = Follow::count_followers(state.db(), user.id).await?;
    let following_count = Follow::count_following(state.db(), user.id).await?;

    let is_following = match actor.user_id() {
        Some(viewer) if viewer != user.id => Follow::exists(state.db(), viewer, user.id).await?,
        _ => false,
    };

    let visible = actor_can_read(&state, &actor, &user).await?;

    let (bio, created) = if visible {
        (user.bio.clone(), Some(user.created))
    } else {
        (None, None)
    };

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name,
        bio,
        created,
        follower_count,
        following_count,
        is_following,
        visible,
    }))
}

/// Update the current user's profile and privacy preferences.
///
/// PUT /api/profile
async fn update_own_profile(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let user_id = require_user(&session).await?;

    let user = User::update_profile(
        state.db(),
        user_id,
        UpdateProfile {
            bio: request.bio,
            privacy_level: request.privacy_level,
            blog_default_privacy: request.blog_default_privacy,
            file_default_privacy: request.file_default_privacy,
        },
    )
    .await?
    .ok_or(AppError::Unauthorized)?;

    Ok(Json(user))
}

/// Follow a user.
///
/// POST /api/users/{name}/follow
async fn follow_user(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = require_user(&session).await?;
    let target = find_user(&state, &name).await?;

    if target.id == user_id {
        return Err(AppError::BadRequest("you cannot follow yourself".to_string()));
    }

    let created = Follow::follow(state.db(), user_id, target.id).await?;

    if created {
        info!(follower = %user_id, following = %target.id, "follow created");
    }

    Ok(Json(serde_json::json!({ "following": true, "created": created })))
}

/// Unfollow a user.
///
/// DELETE /api/users/{name}/follow
async fn unfollow_user(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = require_user(&session).await?;
    let target = find_user(&state, &name).await?;

    let removed = Follow::unfollow(state.db(), user_id, target.id).await?;

    if removed {
        info!(follower = %user_id, following = %target.id, "follow removed");
    }

    Ok(Json(serde_json::json!({ "following": false, "removed": removed })))
}

/// List a user's followers.
///
/// GET /api/users/{name}/followers
async fn list_followers(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ProfileListResponse>> {
    let user = find_user(&state, &name).await?;

    let (limit, offset) = pagination.limit_offset();
    let users = Follow::list_followers(state.db(), user.id, limit, offset).await?;

    Ok(Json(ProfileListResponse { users }))
}

/// List the users a user follows.
///
/// GET /api/users/{name}/following
async fn list_following(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ProfileListResponse>> {
    let user = find_user(&state, &name).await?;

    let (limit, offset) = pagination.limit_offset();
    let users = Follow::list_following(state.db(), user.id, limit, offset).await?;

    Ok(Json(ProfileListResponse { users }))
}

/// List a user's topics the current actor may read.
///
/// GET /api/users/{name}/topics
async fn list_user_topics(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<UserTopicsResponse>> {
    let user = find_user(&state, &name).await?;

    let actor = current_actor(&session).await;
    let topics = Topic::list_by_author(state.db(), user.id).await?;
    let topics = filter_readable(&state, &actor, topics).await?;

    Ok(Json(UserTopicsResponse { topics }))
}
