//! Block-based rich content.
//!
//! This module provides:
//! - `Document`: an ordered, non-empty sequence of typed blocks
//! - `Block` / `BlockKind` / `BlockMetadata`: the block value types
//! - Editing operations (insert, remove, move, update, change kind) as pure
//!   value transformations
//! - `render_document`: server-side HTML rendering of a document

pub mod document;
pub mod render;

pub use document::{Block, BlockKind, BlockMetadata, Direction, Document, DocumentError};
pub use render::render_document;
