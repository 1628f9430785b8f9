//! Forum topic model.
//!
//! Topics are owned content: reads outside the owner go through the
//! visibility policy, mutations are owner-only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::{OwnedContent, PrivacyLevel};

/// Topic record.
#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Category this topic belongs to.
    pub category_id: Uuid,

    /// Author user ID; immutable after creation.
    pub author_id: Uuid,

    /// Topic title.
    pub title: String,

    /// Opening post body.
    pub body: String,

    /// Visibility level. Topics default to public.
    pub privacy_level: PrivacyLevel,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Database row for a topic; privacy is stored as TEXT.
#[derive(sqlx::FromRow)]
struct TopicRow {
    id: Uuid,
    category_id: Uuid,
    author_id: Uuid,
    title: String,
    body: String,
    privacy_level: String,
    created: i64,
    changed: i64,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            author_id: row.author_id,
            title: row.title,
            body: row.body,
            privacy_level: PrivacyLevel::from_stored(&row.privacy_level),
            created: row.created,
            changed: row.changed,
        }
    }
}

impl OwnedContent for Topic {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.author_id)
    }

    fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_level
    }
}

/// Input for creating a topic.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopic {
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub privacy_level: Option<PrivacyLevel>,
}

/// Input for updating a topic.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTopic {
    pub title: Option<String>,
    pub body: Option<String>,
}

const TOPIC_COLUMNS: &str =
    "id, category_id, author_id, title, body, privacy_level, created, changed";

impl Topic {
    /// Create a new topic. Defaults to public visibility.
    pub async fn create(pool: &PgPool, input: CreateTopic) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();
        let privacy = input.privacy_level.unwrap_or(PrivacyLevel::Public);

        let row = sqlx::query_as::<_, TopicRow>(&format!(
            r#"
            INSERT INTO topic (id, category_id, author_id, title, body, privacy_level, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(input.author_id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(privacy.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create topic")?;

        Ok(row.into())
    }

    /// Find a topic by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topic WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch topic by id")?;

        Ok(row.map(Topic::from))
    }

    /// List topics in a category, newest first.
    ///
    /// Visibility filtering happens in the caller; this returns every row.
    pub async fn list_for_category(
        pool: &PgPool,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topic WHERE category_id = $1 ORDER BY created DESC LIMIT $2 OFFSET $3"
        ))
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list topics for category")?;

        Ok(rows.into_iter().map(Topic::from).collect())
    }

    /// List topics by author, newest first.
    pub async fn list_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, TopicRow>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topic WHERE author_id = $1 ORDER BY created DESC"
        ))
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("failed to list topics by author")?;

        Ok(rows.into_iter().map(Topic::from).collect())
    }

    /// Update title/body. Absent fields keep their current values; `changed`
    /// advances.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateTopic) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let title = input.title.unwrap_or(current.title);
        let body = input.body.unwrap_or(current.body);
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, TopicRow>(&format!(
            r#"
            UPDATE topic SET title = $1, body = $2, changed = $3
            WHERE id = $4
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(&title)
        .bind(&body)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update topic")?;

        Ok(row.map(Topic::from))
    }

    /// Change the privacy level. `changed` advances.
    pub async fn set_privacy(
        pool: &PgPool,
        id: Uuid,
        privacy: PrivacyLevel,
    ) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, TopicRow>(&format!(
            r#"
            UPDATE topic SET privacy_level = $1, changed = $2
            WHERE id = $3
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(privacy.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to change topic privacy")?;

        Ok(row.map(Topic::from))
    }

    /// Delete a topic. Replies are deleted via CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM topic WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete topic")?;

        Ok(result.rows_affected() > 0)
    }

    /// Count topics in a category.
    pub async fn count_for_category(pool: &PgPool, category_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topic WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(pool)
            .await
            .context("failed to count topics")?;

        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::access::{Actor, can_mutate, can_read};

    fn test_topic(author_id: Uuid, privacy: PrivacyLevel) -> Topic {
        Topic {
            id: Uuid::now_v7(),
            category_id: Uuid::now_v7(),
            author_id,
            title: "Test topic".to_string(),
            body: "Body".to_string(),
            privacy_level: privacy,
            created: 0,
            changed: 0,
        }
    }

    #[test]
    fn private_topic_readable_by_owner_only() {
        let owner = Uuid::now_v7();
        let topic = test_topic(owner, PrivacyLevel::Private);

        assert!(can_read(&topic, &Actor::Authenticated(owner), |_, _| true));
        assert!(!can_read(
            &topic,
            &Actor::Authenticated(Uuid::now_v7()),
            |_, _| true
        ));
    }

    #[test]
    fn topics_are_never_drafts() {
        let topic = test_topic(Uuid::now_v7(), PrivacyLevel::Public);
        assert!(!topic.is_draft());
        assert!(can_read(&topic, &Actor::Anonymous, |_, _| false));
    }

    #[test]
    fn only_author_mutates_topic() {
        let owner = Uuid::now_v7();
        let topic = test_topic(owner, PrivacyLevel::Public);

        assert!(can_mutate(&topic, &Actor::Authenticated(owner)));
        assert!(!can_mutate(&topic, &Actor::Anonymous));
    }
}
