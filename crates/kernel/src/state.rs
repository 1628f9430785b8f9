//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::file::{FileService, LocalFileStorage};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// File service for uploads.
    files: FileService,

    /// Loaded configuration.
    config: Config,
}

impl AppState {
    /// Initialize application state: database pool, migrations, and the
    /// file service.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool).await?;
        info!("database migrations applied");

        let storage = Arc::new(LocalFileStorage::new(
            config.uploads_dir.clone(),
            config.files_url.clone(),
        ));
        let files = FileService::new(pool.clone(), storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db: pool,
                files,
                config: config.clone(),
            }),
        })
    }

    /// The database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// The file service.
    pub fn files(&self) -> &FileService {
        &self.inner.files
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
