//! Forum category model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Category record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// URL-safe unique slug.
    pub slug: String,

    /// Optional description shown on the category page.
    pub description: Option<String>,

    /// Unix timestamp when created.
    pub created: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Category {
    /// Create a new category.
    pub async fn create(pool: &PgPool, input: CreateCategory) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO category (id, name, slug, description, created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, created
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create category")?;

        Ok(category)
    }

    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created FROM category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch category by id")?;

        Ok(category)
    }

    /// Find a category by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created FROM category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("failed to fetch category by slug")?;

        Ok(category)
    }

    /// List all categories by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created FROM category ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories")?;

        Ok(categories)
    }

    /// Update a category. Absent fields keep their current values.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateCategory) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let name = input.name.unwrap_or(current.name);
        let description = input.description.or(current.description);

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE category SET name = $1, description = $2
            WHERE id = $3
            RETURNING id, name, slug, description, created
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update category")?;

        Ok(category)
    }

    /// Delete a category. Topics in the category are deleted via CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete category")?;

        Ok(result.rows_affected() > 0)
    }
}
