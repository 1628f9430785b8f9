//! Follow relationships between users.
//!
//! A follow is a directed edge `(follower_id, following_id)`, unique per
//! ordered pair. The edge doubles as the friend predicate for friends-only
//! visibility.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Follow edge record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub following_id: Uuid,

    /// Unix timestamp when the edge was created.
    pub created: i64,
}

/// Lightweight user reference for follower/following listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProfileRef {
    pub id: Uuid,
    pub name: String,
}

impl Follow {
    /// Create a follow edge.
    ///
    /// Idempotent: following someone already followed changes nothing.
    /// The primary key on `(follower_id, following_id)` keeps duplicate
    /// edges out even under concurrent requests. Returns whether a new
    /// edge was inserted.
    pub async fn follow(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        if follower_id == following_id {
            bail!("users cannot follow themselves");
        }

        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO user_follows (follower_id, following_id, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .bind(now)
        .execute(pool)
        .await
        .context("failed to create follow")?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a follow edge. Returns whether an edge was removed.
    pub async fn unfollow(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM user_follows WHERE follower_id = $1 AND following_id = $2",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await
        .context("failed to delete follow")?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether `follower_id` follows `following_id`.
    ///
    /// This is the friend predicate consumed by the visibility policy.
    pub async fn exists(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(pool)
        .await
        .context("failed to check follow")?;

        Ok(exists)
    }

    /// Count users following `user_id`.
    pub async fn count_followers(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE following_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await
                .context("failed to count followers")?;

        Ok(count)
    }

    /// Count users `user_id` follows.
    pub async fn count_following(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await
                .context("failed to count following")?;

        Ok(count)
    }

    /// List users following `user_id`, newest edge first.
    pub async fn list_followers(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProfileRef>> {
        let rows = sqlx::query_as::<_, ProfileRef>(
            r#"
            SELECT u.id, u.name
            FROM user_follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list followers")?;

        Ok(rows)
    }

    /// List users `user_id` follows, newest edge first.
    pub async fn list_following(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProfileRef>> {
        let rows = sqlx::query_as::<_, ProfileRef>(
            r#"
            SELECT u.id, u.name
            FROM user_follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list following")?;

        Ok(rows)
    }
}
