//! Authentication routes (register, login, logout, current user).

use anyhow::Context;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{CreateUser, User};
use crate::routes::helpers::{current_actor, is_valid_username};
use crate::state::AppState;

/// Session key for storing the authenticated user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Minimum password length for new accounts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub mail: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Response wrapping the current user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Register a new account and log it in.
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    if !is_valid_username(&request.name) {
        return Err(AppError::BadRequest(
            "username must be 3-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }

    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if !request.mail.contains('@') {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }

    if User::find_by_name(state.db(), &request.name).await?.is_some() {
        return Err(AppError::BadRequest("username is taken".to_string()));
    }

    if User::find_by_mail(state.db(), &request.mail).await?.is_some() {
        return Err(AppError::BadRequest("email is already registered".to_string()));
    }

    let user = User::create(
        state.db(),
        CreateUser {
            name: request.name,
            password: request.password,
            mail: request.mail,
        },
    )
    .await?;

    store_session_user(&session, user.id).await?;

    info!(user = %user.name, "account registered");

    Ok(Json(UserResponse { user }))
}

/// Log in with username and password.
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = User::find_by_name(state.db(), &request.name)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active() || !user.verify_password(&request.password) {
        return Err(AppError::Unauthorized);
    }

    // Rotate the session ID on privilege change.
    session
        .cycle_id()
        .await
        .context("failed to cycle session id")?;

    store_session_user(&session, user.id).await?;

    info!(user = %user.name, "user logged in");

    Ok(Json(UserResponse { user }))
}

/// Log out the current session.
///
/// POST /api/auth/logout
async fn logout(session: Session) -> AppResult<Json<serde_json::Value>> {
    session.flush().await.context("failed to clear session")?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Return the currently authenticated user.
///
/// GET /api/auth/me
async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<UserResponse>> {
    let actor = current_actor(&session).await;
    let user_id = actor.user_id().ok_or(AppError::Unauthorized)?;

    let user = User::find_by_id(state.db(), user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserResponse { user }))
}

async fn store_session_user(session: &Session, user_id: uuid::Uuid) -> AppResult<()> {
    session
        .insert(SESSION_USER_ID, user_id)
        .await
        .context("failed to persist session")?;

    Ok(())
}
