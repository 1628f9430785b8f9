//! File management service.
//!
//! Handles upload validation, file metadata storage, and cleanup. Stored
//! files are owned content: each row carries a privacy level (default
//! private) checked by the visibility policy before bytes are served.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::storage::FileStorage;
use crate::access::{OwnedContent, PrivacyLevel};

/// Maximum file size (10 MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Allowed MIME types for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
    // Archives
    "application/zip",
    "application/gzip",
];

/// Stored file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub uri: String,
    pub mime: String,
    pub size: i64,
    pub privacy_level: PrivacyLevel,
    pub created: i64,
    pub changed: i64,
}

impl OwnedContent for StoredFile {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.owner_id)
    }

    fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_level
    }
}

/// Database row for a stored file; privacy is TEXT.
#[derive(sqlx::FromRow)]
struct FileRow {
    id: Uuid,
    owner_id: Uuid,
    filename: String,
    uri: String,
    mime: String,
    size: i64,
    privacy_level: String,
    created: i64,
    changed: i64,
}

impl From<FileRow> for StoredFile {
    fn from(row: FileRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            filename: row.filename,
            uri: row.uri,
            mime: row.mime,
            size: row.size,
            privacy_level: PrivacyLevel::from_stored(&row.privacy_level),
            created: row.created,
            changed: row.changed,
        }
    }
}

const FILE_COLUMNS: &str =
    "id, owner_id, filename, uri, mime, size, privacy_level, created, changed";

/// File service for managing uploads.
pub struct FileService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl FileService {
    /// Create a new file service.
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    /// Upload a file.
    ///
    /// Validates size and MIME type, stores the bytes, and creates the
    /// database record. The MIME type is sniffed from the content; the
    /// client-declared type is only trusted when sniffing finds nothing.
    pub async fn upload(
        &self,
        owner_id: Uuid,
        filename: &str,
        declared_mime: &str,
        data: &[u8],
        privacy: PrivacyLevel,
    ) -> Result<StoredFile> {
        if data.is_empty() {
            bail!("empty file");
        }

        if data.len() > MAX_FILE_SIZE {
            bail!(
                "file too large: {} bytes (max {} bytes)",
                data.len(),
                MAX_FILE_SIZE
            );
        }

        let mime = match infer::get(data) {
            Some(kind) => kind.mime_type().to_string(),
            None => declared_mime.to_string(),
        };

        if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            bail!("file type not allowed: {}", mime);
        }

        let uri = self.storage.generate_uri(filename);

        self.storage
            .write(&uri, data)
            .await
            .context("failed to write file to storage")?;

        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, FileRow>(&format!(
            r#"
            INSERT INTO stored_file (id, owner_id, filename, uri, mime, size, privacy_level, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(filename)
        .bind(&uri)
        .bind(&mime)
        .bind(data.len() as i64)
        .bind(privacy.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("failed to create file record")?;

        debug!(
            id = %id,
            filename = %filename,
            uri = %uri,
            size = data.len(),
            "file uploaded"
        );

        Ok(row.into())
    }

    /// Get file info by ID.
    pub async fn get(&self, id: Uuid) -> Result<Option<StoredFile>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM stored_file WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch file")?;

        Ok(row.map(StoredFile::from))
    }

    /// List files owned by a user, newest first.
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredFile>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM stored_file WHERE owner_id = $1 ORDER BY created DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("failed to list files")?;

        Ok(rows.into_iter().map(StoredFile::from).collect())
    }

    /// Count files owned by a user.
    pub async fn count_for_owner(&self, owner_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stored_file WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .context("failed to count files")?;

        Ok(count)
    }

    /// Read a file's bytes from storage.
    pub async fn read(&self, file: &StoredFile) -> Result<Vec<u8>> {
        self.storage.read(&file.uri).await
    }

    /// Change a file's privacy level. `changed` advances.
    pub async fn set_privacy(&self, id: Uuid, privacy: PrivacyLevel) -> Result<Option<StoredFile>> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, FileRow>(&format!(
            r#"
            UPDATE stored_file SET privacy_level = $1, changed = $2
            WHERE id = $3
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(privacy.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to change file privacy")?;

        Ok(row.map(StoredFile::from))
    }

    /// Delete a file record and its stored bytes.
    pub async fn delete(&self, file: &StoredFile) -> Result<()> {
        self.storage
            .delete(&file.uri)
            .await
            .context("failed to delete file from storage")?;

        sqlx::query("DELETE FROM stored_file WHERE id = $1")
            .bind(file.id)
            .execute(&self.pool)
            .await
            .context("failed to delete file record")?;

        Ok(())
    }

    /// Public URL for a stored file.
    pub fn public_url(&self, file: &StoredFile) -> String {
        self.storage.public_url(&file.uri)
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService").finish()
    }
}

/// Sanitize a filename for safe storage.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    use std::path::Path;

    // Get just the filename part (no path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    // Replace unsafe characters
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>()
        .chars()
        .take(200)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::access::{Actor, can_read};

    #[test]
    fn sanitize_filename_basics() {
        assert_eq!(sanitize_filename("test.jpg"), "test.jpg");
        assert_eq!(sanitize_filename("my file.jpg"), "my_file.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("test<script>.jpg"), "test_script_.jpg");
    }

    #[test]
    fn sanitize_filename_traversal_vectors() {
        // Unix-style traversal
        assert_eq!(sanitize_filename("../../../etc/shadow"), "shadow");
        // Windows-style backslash traversal (backslashes replaced on Unix)
        let result = sanitize_filename("..\\..\\windows\\system32\\config");
        assert!(!result.contains('\\'), "backslashes should be sanitized");
        // Null byte injection (stripped by Path::file_name)
        let result = sanitize_filename("shell.php\0.jpg");
        assert!(!result.contains('\0'));
        // Double encoding attempt: % is not in the allowed charset
        let result = sanitize_filename("..%2F..%2Fetc%2Fpasswd");
        assert!(!result.contains('%'), "percent signs should be sanitized");
        assert!(!result.contains('/'), "slashes should not appear");
    }

    #[test]
    fn stored_file_defaults_deny_strangers() {
        let owner = Uuid::now_v7();
        let file = StoredFile {
            id: Uuid::now_v7(),
            owner_id: owner,
            filename: "notes.txt".to_string(),
            uri: "local://2026/08/abc_notes.txt".to_string(),
            mime: "text/plain".to_string(),
            size: 12,
            privacy_level: PrivacyLevel::Private,
            created: 0,
            changed: 0,
        };

        assert!(!can_read(&file, &Actor::Anonymous, |_, _| true));
        assert!(!can_read(
            &file,
            &Actor::Authenticated(Uuid::now_v7()),
            |_, _| true
        ));
        assert!(can_read(&file, &Actor::Authenticated(owner), |_, _| false));
    }
}
