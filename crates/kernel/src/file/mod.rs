//! File management module.
//!
//! This module provides:
//! - `FileStorage` / `LocalFileStorage`: storage backend behind uploads
//! - `FileService`: upload validation, metadata records, and cleanup
//! - `StoredFile`: the owned-content file record

pub mod service;
pub mod storage;

pub use service::{ALLOWED_MIME_TYPES, FileService, MAX_FILE_SIZE, StoredFile};
pub use storage::{FileStorage, LocalFileStorage};
