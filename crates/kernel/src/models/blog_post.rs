//! Blog post model.
//!
//! A post's body is a block document stored as JSONB. The database holds the
//! raw JSON value; callers validate it through [`Document::from_value`] when
//! loading for edit or render, so a hand-mangled row surfaces as
//! `MalformedDocument` instead of rendering garbage.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::{OwnedContent, PrivacyLevel};
use crate::content::{Document, DocumentError};

/// Blog post record.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Author user ID; immutable after creation.
    pub author_id: Uuid,

    /// Post title.
    pub title: String,

    /// URL slug, unique per author.
    pub slug: String,

    /// Block document as stored (JSONB array of block objects).
    pub content: serde_json::Value,

    /// Visibility level, author-selected at creation.
    pub privacy_level: PrivacyLevel,

    /// Whether the post is published. Drafts are owner-only regardless of
    /// privacy level.
    pub published: bool,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Database row for a blog post; privacy is stored as TEXT.
#[derive(sqlx::FromRow)]
struct BlogPostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    slug: String,
    content: serde_json::Value,
    privacy_level: String,
    published: bool,
    created: i64,
    changed: i64,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            privacy_level: PrivacyLevel::from_stored(&row.privacy_level),
            published: row.published,
            created: row.created,
            changed: row.changed,
        }
    }
}

impl OwnedContent for BlogPost {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.author_id)
    }

    fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_level
    }

    fn is_draft(&self) -> bool {
        !self.published
    }
}

/// Input for creating a blog post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogPost {
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: serde_json::Value,
    pub privacy_level: PrivacyLevel,
    pub published: bool,
}

/// Input for updating a blog post.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlogPost {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
}

const POST_COLUMNS: &str =
    "id, author_id, title, slug, content, privacy_level, published, created, changed";

impl BlogPost {
    /// Parse the stored content into a validated [`Document`].
    pub fn document(&self) -> Result<Document, DocumentError> {
        Document::from_value(self.content.clone())
    }

    /// Create a new blog post.
    pub async fn create(pool: &PgPool, input: CreateBlogPost) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            INSERT INTO blog_post (id, author_id, title, slug, content, privacy_level, published, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.author_id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.content)
        .bind(input.privacy_level.as_str())
        .bind(input.published)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create blog post")?;

        Ok(row.into())
    }

    /// Find a post by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blog post by id")?;

        Ok(row.map(BlogPost::from))
    }

    /// Find a post by author and slug.
    pub async fn find_by_author_slug(
        pool: &PgPool,
        author_id: Uuid,
        slug: &str,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE author_id = $1 AND slug = $2"
        ))
        .bind(author_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blog post by slug")?;

        Ok(row.map(BlogPost::from))
    }

    /// List published public posts, newest first. This is the anonymous
    /// front-page feed; the database filter matches what the policy would
    /// allow an anonymous reader.
    pub async fn list_published_public(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM blog_post
            WHERE published = TRUE AND privacy_level = 'public'
            ORDER BY created DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list published posts")?;

        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    /// List every post by an author, newest first. Callers filter through
    /// the visibility policy before exposing the result.
    pub async fn list_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE author_id = $1 ORDER BY created DESC"
        ))
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("failed to list blog posts by author")?;

        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    /// Update title/content. Absent fields keep their current values;
    /// `changed` advances.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateBlogPost) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let title = input.title.unwrap_or(current.title);
        let content = input.content.unwrap_or(current.content);
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            UPDATE blog_post SET title = $1, content = $2, changed = $3
            WHERE id = $4
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&title)
        .bind(&content)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update blog post")?;

        Ok(row.map(BlogPost::from))
    }

    /// Change the privacy level. `changed` advances.
    pub async fn set_privacy(
        pool: &PgPool,
        id: Uuid,
        privacy: PrivacyLevel,
    ) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            UPDATE blog_post SET privacy_level = $1, changed = $2
            WHERE id = $3
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(privacy.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to change blog post privacy")?;

        Ok(row.map(BlogPost::from))
    }

    /// Publish or unpublish. `changed` advances.
    pub async fn set_published(pool: &PgPool, id: Uuid, published: bool) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            UPDATE blog_post SET published = $1, changed = $2
            WHERE id = $3
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(published)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to change blog post published state")?;

        Ok(row.map(BlogPost::from))
    }

    /// Delete a post and its block document.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_post WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete blog post")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::access::{Actor, can_read};
    use serde_json::json;

    fn test_post(author_id: Uuid, privacy: PrivacyLevel, published: bool) -> BlogPost {
        BlogPost {
            id: Uuid::now_v7(),
            author_id,
            title: "Post".to_string(),
            slug: "post".to_string(),
            content: json!([{ "id": "b1", "type": "paragraph", "content": "hello" }]),
            privacy_level: privacy,
            published,
            created: 0,
            changed: 0,
        }
    }

    #[test]
    fn draft_hidden_from_everyone_but_owner() {
        let owner = Uuid::now_v7();
        let post = test_post(owner, PrivacyLevel::Public, false);

        assert!(post.is_draft());
        assert!(!can_read(&post, &Actor::Anonymous, |_, _| true));
        assert!(!can_read(
            &post,
            &Actor::Authenticated(Uuid::now_v7()),
            |_, _| true
        ));
        assert!(can_read(&post, &Actor::Authenticated(owner), |_, _| false));
    }

    #[test]
    fn published_public_post_readable_anonymously() {
        let post = test_post(Uuid::now_v7(), PrivacyLevel::Public, true);
        assert!(can_read(&post, &Actor::Anonymous, |_, _| false));
    }

    #[test]
    fn stored_content_parses_into_document() {
        let post = test_post(Uuid::now_v7(), PrivacyLevel::Public, true);
        let doc = post.document().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].content, "hello");
    }

    #[test]
    fn mangled_content_fails_as_malformed() {
        let mut post = test_post(Uuid::now_v7(), PrivacyLevel::Public, true);
        post.content = json!({ "not": "an array" });
        assert!(matches!(
            post.document().unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
    }
}
