//! Topic reply model.
//!
//! Replies carry no privacy level of their own: read visibility follows the
//! parent topic, mutation is author-only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Reply record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reply {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Parent topic ID.
    pub topic_id: Uuid,

    /// Author user ID.
    pub author_id: Uuid,

    /// Reply body.
    pub body: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a reply.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReply {
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

impl Reply {
    /// Create a new reply.
    pub async fn create(pool: &PgPool, input: CreateReply) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let reply = sqlx::query_as::<_, Reply>(
            r#"
            INSERT INTO reply (id, topic_id, author_id, body, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, topic_id, author_id, body, created, changed
            "#,
        )
        .bind(id)
        .bind(input.topic_id)
        .bind(input.author_id)
        .bind(&input.body)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create reply")?;

        Ok(reply)
    }

    /// Find a reply by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let reply = sqlx::query_as::<_, Reply>(
            "SELECT id, topic_id, author_id, body, created, changed FROM reply WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch reply by id")?;

        Ok(reply)
    }

    /// List replies for a topic in posting order.
    pub async fn list_for_topic(
        pool: &PgPool,
        topic_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let replies = sqlx::query_as::<_, Reply>(
            r#"
            SELECT id, topic_id, author_id, body, created, changed
            FROM reply
            WHERE topic_id = $1
            ORDER BY created
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(topic_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list replies for topic")?;

        Ok(replies)
    }

    /// Update the body; `changed` advances.
    pub async fn update(pool: &PgPool, id: Uuid, body: &str) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let reply = sqlx::query_as::<_, Reply>(
            r#"
            UPDATE reply SET body = $1, changed = $2
            WHERE id = $3
            RETURNING id, topic_id, author_id, body, created, changed
            "#,
        )
        .bind(body)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update reply")?;

        Ok(reply)
    }

    /// Delete a reply.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reply WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete reply")?;

        Ok(result.rows_affected() > 0)
    }

    /// Count replies for a topic.
    pub async fn count_for_topic(pool: &PgPool, topic_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reply WHERE topic_id = $1")
            .bind(topic_id)
            .fetch_one(pool)
            .await
            .context("failed to count replies")?;

        Ok(count)
    }
}
