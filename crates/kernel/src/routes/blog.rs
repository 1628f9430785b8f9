//! Blog post routes.
//!
//! Post bodies are block documents; every write validates the document
//! shape before it reaches the database, and reads render the stored
//! document to HTML. Reads are policy-gated; hidden posts answer 404.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::access::{Actor, PrivacyLevel, can_change_privacy, can_mutate};
use crate::content::{Document, render_document};
use crate::error::{AppError, AppResult};
use crate::models::{BlogPost, CreateBlogPost, UpdateBlogPost, User};
use crate::routes::helpers::{
    Pagination, actor_can_read, current_actor, filter_readable, require_user, slugify,
};
use crate::state::AppState;

/// Create the blog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", get(list_feed).post(create_post))
        .route(
            "/api/blogs/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/blogs/{id}/privacy", put(set_post_privacy))
        .route("/api/blogs/{id}/publish", put(set_post_published))
        .route("/api/blogs/by-slug/{username}/{slug}", get(get_post_by_slug))
        .route("/api/users/{name}/blogs", get(list_author_posts))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    /// Block document as a JSON array; defaults to a single empty paragraph.
    pub content: Option<serde_json::Value>,
    /// Defaults to the author's blog privacy preference.
    pub privacy_level: Option<PrivacyLevel>,
    /// Defaults to draft.
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetPrivacyRequest {
    pub privacy_level: PrivacyLevel,
}

#[derive(Debug, Deserialize)]
pub struct SetPublishedRequest {
    pub published: bool,
}

#[derive(Debug, Serialize)]
pub struct BlogPostResponse {
    #[serde(flatten)]
    pub post: BlogPost,
    /// Server-rendered HTML of the block document.
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct BlogListResponse {
    pub posts: Vec<BlogPost>,
}

/// Validate a request's content as a block document, returning the value
/// that goes to storage.
fn validated_content(content: Option<serde_json::Value>) -> AppResult<serde_json::Value> {
    match content {
        Some(value) => {
            Document::from_value(value.clone())?;
            Ok(value)
        }
        None => Ok(Document::new().to_value()),
    }
}

/// Render a post's stored document, surfacing stored garbage as an error
/// rather than rendering it.
fn rendered(post: &BlogPost) -> AppResult<String> {
    let doc = post.document()?;
    Ok(render_document(&doc))
}

/// The published, public feed, newest first.
///
/// GET /api/blogs
async fn list_feed(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<BlogListResponse>> {
    let (limit, offset) = pagination.limit_offset();
    let posts = BlogPost::list_published_public(state.db(), limit, offset).await?;

    Ok(Json(BlogListResponse { posts }))
}

/// Create a blog post.
///
/// POST /api/blogs
async fn create_post(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<Json<BlogPost>> {
    let user_id = require_user(&session).await?;

    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("post title is required".to_string()));
    }

    let content = validated_content(request.content)?;

    let author = User::find_by_id(state.db(), user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let privacy = request
        .privacy_level
        .unwrap_or(author.blog_default_privacy);

    let mut slug = slugify(&request.title);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "post title must contain letters or digits".to_string(),
        ));
    }

    // Slugs are unique per author; disambiguate collisions with a short
    // random suffix.
    if BlogPost::find_by_author_slug(state.db(), user_id, &slug)
        .await?
        .is_some()
    {
        let suffix = Uuid::now_v7().simple().to_string();
        slug = format!("{slug}-{}", &suffix[..8]);
    }

    let post = BlogPost::create(
        state.db(),
        CreateBlogPost {
            author_id: user_id,
            title: request.title.trim().to_string(),
            slug,
            content,
            privacy_level: privacy,
            published: request.published.unwrap_or(false),
        },
    )
    .await?;

    info!(post_id = %post.id, slug = %post.slug, "blog post created");

    Ok(Json(post))
}

/// Load a post and enforce the read policy for the current actor.
async fn load_readable_post(
    state: &AppState,
    session: &Session,
    id: Uuid,
) -> AppResult<BlogPost> {
    let post = BlogPost::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    let actor = current_actor(session).await;
    if !actor_can_read(state, &actor, &post).await? {
        return Err(AppError::NotFound);
    }

    Ok(post)
}

/// Load a post and require the current actor to own it.
async fn load_owned_post(state: &AppState, session: &Session, id: Uuid) -> AppResult<BlogPost> {
    let user_id = require_user(session).await?;

    let post = BlogPost::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !can_mutate(&post, &Actor::Authenticated(user_id)) {
        return Err(AppError::Forbidden);
    }

    Ok(post)
}

/// Get a post with rendered HTML.
///
/// GET /api/blogs/{id}
async fn get_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BlogPostResponse>> {
    let post = load_readable_post(&state, &session, id).await?;
    let html = rendered(&post)?;

    Ok(Json(BlogPostResponse { post, html }))
}

/// Get a post by author username and slug.
///
/// GET /api/blogs/by-slug/{username}/{slug}
async fn get_post_by_slug(
    State(state): State<AppState>,
    session: Session,
    Path((username, slug)): Path<(String, String)>,
) -> AppResult<Json<BlogPostResponse>> {
    let author = User::find_by_name(state.db(), &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let post = BlogPost::find_by_author_slug(state.db(), author.id, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let actor = current_actor(&session).await;
    if !actor_can_read(&state, &actor, &post).await? {
        return Err(AppError::NotFound);
    }

    let html = rendered(&post)?;

    Ok(Json(BlogPostResponse { post, html }))
}

/// List an author's posts the current actor may read.
///
/// GET /api/users/{name}/blogs
async fn list_author_posts(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<BlogListResponse>> {
    let author = User::find_by_name(state.db(), &name)
        .await?
        .ok_or(AppError::NotFound)?;

    let actor = current_actor(&session).await;
    let posts = BlogPost::list_by_author(state.db(), author.id).await?;
    let posts = filter_readable(&state, &actor, posts).await?;

    Ok(Json(BlogListResponse { posts }))
}

/// Update a post's title/content.
///
/// PUT /api/blogs/{id}
async fn update_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> AppResult<Json<BlogPost>> {
    let post = load_owned_post(&state, &session, id).await?;

    let content = match request.content {
        Some(value) => {
            Document::from_value(value.clone())?;
            Some(value)
        }
        None => None,
    };

    let post = BlogPost::update(
        state.db(),
        post.id,
        UpdateBlogPost {
            title: request.title,
            content,
        },
    )
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(post))
}

/// Change a post's privacy level.
///
/// PUT /api/blogs/{id}/privacy
async fn set_post_privacy(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPrivacyRequest>,
) -> AppResult<Json<BlogPost>> {
    let user_id = require_user(&session).await?;

    let post = BlogPost::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !can_change_privacy(&post, &Actor::Authenticated(user_id), request.privacy_level) {
        return Err(AppError::Forbidden);
    }

    let post = BlogPost::set_privacy(state.db(), post.id, request.privacy_level)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(post_id = %post.id, privacy = %post.privacy_level, "blog post privacy changed");

    Ok(Json(post))
}

/// Publish or unpublish a post.
///
/// PUT /api/blogs/{id}/publish
async fn set_post_published(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPublishedRequest>,
) -> AppResult<Json<BlogPost>> {
    let post = load_owned_post(&state, &session, id).await?;

    let post = BlogPost::set_published(state.db(), post.id, request.published)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(post_id = %post.id, published = post.published, "blog post publish state changed");

    Ok(Json(post))
}

/// Delete a post.
///
/// DELETE /api/blogs/{id}
async fn delete_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let post = load_owned_post(&state, &session, id).await?;

    if !BlogPost::delete(state.db(), post.id).await? {
        return Err(AppError::NotFound);
    }

    info!(post_id = %post.id, "blog post deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
