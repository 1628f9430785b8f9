//! Forum category routes.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{Category, CreateCategory, Topic, UpdateCategory};
use crate::routes::helpers::{Pagination, current_actor, filter_readable, require_user, slugify};
use crate::state::AppState;

/// Create the category router. Categories are addressed by slug.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{slug}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route(
            "/api/categories/{slug}/topics",
            get(list_category_topics).post(create_topic_in_category),
        )
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: Category,
    pub topic_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
}

#[derive(Debug, Serialize)]
pub struct CategoryTopicsResponse {
    pub category: Category,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Category> {
    Category::find_by_slug(state.db(), slug)
        .await?
        .ok_or(AppError::NotFound)
}

/// List all categories with topic counts.
///
/// GET /api/categories
async fn list_categories(State(state): State<AppState>) -> AppResult<Json<CategoryListResponse>> {
    let categories = Category::list_all(state.db()).await?;

    let mut out = Vec::with_capacity(categories.len());
    for category in categories {
        let topic_count = Topic::count_for_category(state.db(), category.id).await?;
        out.push(CategoryResponse {
            category,
            topic_count,
        });
    }

    Ok(Json(CategoryListResponse { categories: out }))
}

/// Create a category.
///
/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateCategoryRequest>,
) -> AppResult<Json<Category>> {
    require_user(&session).await?;

    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("category name is required".to_string()));
    }

    let slug = slugify(&request.name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "category name must contain letters or digits".to_string(),
        ));
    }

    if Category::find_by_slug(state.db(), &slug).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "a category with slug '{slug}' already exists"
        )));
    }

    let category = Category::create(
        state.db(),
        CreateCategory {
            name: request.name.trim().to_string(),
            slug,
            description: request.description,
        },
    )
    .await?;

    info!(category = %category.slug, "category created");

    Ok(Json(category))
}

/// Get a category by slug.
///
/// GET /api/categories/{slug}
async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<CategoryResponse>> {
    let category = find_by_slug(&state, &slug).await?;
    let topic_count = Topic::count_for_category(state.db(), category.id).await?;

    Ok(Json(CategoryResponse {
        category,
        topic_count,
    }))
}

/// List the topics in a category the current actor may read.
///
/// GET /api/categories/{slug}/topics
async fn list_category_topics(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<CategoryTopicsResponse>> {
    let category = find_by_slug(&state, &slug).await?;

    let actor = current_actor(&session).await;
    let (limit, offset) = pagination.limit_offset();

    let topics = Topic::list_for_category(state.db(), category.id, limit, offset).await?;
    let topics = filter_readable(&state, &actor, topics).await?;

    Ok(Json(CategoryTopicsResponse { category, topics }))
}

/// Create a topic in a category.
///
/// POST /api/categories/{slug}/topics
async fn create_topic_in_category(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Json(request): Json<crate::routes::topic::CreateTopicRequest>,
) -> AppResult<Json<Topic>> {
    let user_id = require_user(&session).await?;
    let category = find_by_slug(&state, &slug).await?;

    crate::routes::topic::create_topic(&state, user_id, category.id, request).await
}

/// Update a category.
///
/// PUT /api/categories/{slug}
async fn update_category(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Json(request): Json<UpdateCategory>,
) -> AppResult<Json<Category>> {
    require_user(&session).await?;

    let category = find_by_slug(&state, &slug).await?;
    let category = Category::update(state.db(), category.id, request)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(category))
}

/// Delete a category and its topics.
///
/// DELETE /api/categories/{slug}
async fn delete_category(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    require_user(&session).await?;

    let category = find_by_slug(&state, &slug).await?;

    if !Category::delete(state.db(), category.id).await? {
        return Err(AppError::NotFound);
    }

    info!(category = %category.slug, "category deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
