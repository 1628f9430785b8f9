//! User model and CRUD operations.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::{OwnedContent, PrivacyLevel};

/// User record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub pass: String,
    pub mail: String,
    pub bio: Option<String>,
    /// Visibility of the profile page itself.
    pub privacy_level: PrivacyLevel,
    /// Default privacy for new blog posts.
    pub blog_default_privacy: PrivacyLevel,
    /// Default privacy for uploaded files.
    pub file_default_privacy: PrivacyLevel,
    pub status: i16,
    pub created: DateTime<Utc>,
}

/// Database row for a user. Privacy columns are TEXT; parsing falls back
/// to private for anything unrecognized.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    pass: String,
    mail: String,
    bio: Option<String>,
    privacy_level: String,
    blog_default_privacy: String,
    file_default_privacy: String,
    status: i16,
    created: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            pass: row.pass,
            mail: row.mail,
            bio: row.bio,
            privacy_level: PrivacyLevel::from_stored(&row.privacy_level),
            blog_default_privacy: PrivacyLevel::from_stored(&row.blog_default_privacy),
            file_default_privacy: PrivacyLevel::from_stored(&row.file_default_privacy),
            status: row.status,
            created: row.created,
        }
    }
}

/// A profile page is content owned by its user: `privacy_level` controls
/// who sees the full profile.
impl OwnedContent for User {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_level
    }
}

/// Input for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub password: String,
    pub mail: String,
}

/// Input for updating a user's profile and privacy preferences.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub bio: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
    pub blog_default_privacy: Option<PrivacyLevel>,
    pub file_default_privacy: Option<PrivacyLevel>,
}

const USER_COLUMNS: &str = "id, name, pass, mail, bio, privacy_level, blog_default_privacy, file_default_privacy, status, created";

impl User {
    /// Check if this user is active.
    pub fn is_active(&self) -> bool {
        self.status == 1
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by id")?;

        Ok(row.map(User::from))
    }

    /// Find a user by username.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by name")?;

        Ok(row.map(User::from))
    }

    /// Find a user by email.
    pub async fn find_by_mail(pool: &PgPool, mail: &str) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE mail = $1"
        ))
        .bind(mail)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by mail")?;

        Ok(row.map(User::from))
    }

    /// Create a new user. New accounts default to a public profile,
    /// public blog posts, and private files.
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<Self> {
        let id = Uuid::now_v7();
        let pass = hash_password(&input.password)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, pass, mail)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&pass)
        .bind(&input.mail)
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(row.into())
    }

    /// Update profile fields and privacy preferences. Absent fields keep
    /// their current values.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        input: UpdateProfile,
    ) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let bio = input.bio.or(current.bio);
        let privacy_level = input.privacy_level.unwrap_or(current.privacy_level);
        let blog_default = input
            .blog_default_privacy
            .unwrap_or(current.blog_default_privacy);
        let file_default = input
            .file_default_privacy
            .unwrap_or(current.file_default_privacy);

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                bio = $1,
                privacy_level = $2,
                blog_default_privacy = $3,
                file_default_privacy = $4
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&bio)
        .bind(privacy_level.as_str())
        .bind(blog_default.as_str())
        .bind(file_default.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update user profile")?;

        Ok(row.map(User::from))
    }

    /// Verify a password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password with argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
