//! Block document value model.
//!
//! A blog post body is an ordered sequence of typed blocks, serialized as a
//! JSON array of `{id, type, content, metadata}` objects. The document is an
//! immutable value: every editing operation takes `&self` and returns a new
//! `Document`, leaving the input untouched.
//!
//! Documents are never empty. Removal refuses to delete the last block, and
//! loading an empty array fails validation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors from document operations and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The referenced block does not exist in the document.
    #[error("block not found")]
    NotFound,

    /// The operation would break a document invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// The serialized form fails structural validation.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// The kind of a content block.
///
/// Unrecognized kind strings are preserved as [`Other`] so documents written
/// by newer clients survive a load/store round trip; such blocks render to
/// nothing.
///
/// [`Other`]: BlockKind::Other
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    List,
    Quote,
    Code,
    Image,
    Link,
    /// Forward-compatibility escape hatch: a structurally valid block whose
    /// kind this version does not know.
    Other(String),
}

impl BlockKind {
    /// The wire representation of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading1 => "heading1",
            BlockKind::Heading2 => "heading2",
            BlockKind::Heading3 => "heading3",
            BlockKind::List => "list",
            BlockKind::Quote => "quote",
            BlockKind::Code => "code",
            BlockKind::Image => "image",
            BlockKind::Link => "link",
            BlockKind::Other(name) => name,
        }
    }

    /// Parse a wire kind string. Never fails; unknown strings become
    /// [`BlockKind::Other`].
    pub fn parse(s: &str) -> Self {
        match s {
            "paragraph" => BlockKind::Paragraph,
            "heading1" => BlockKind::Heading1,
            "heading2" => BlockKind::Heading2,
            "heading3" => BlockKind::Heading3,
            "list" => BlockKind::List,
            "quote" => BlockKind::Quote,
            "code" => BlockKind::Code,
            "image" => BlockKind::Image,
            "link" => BlockKind::Link,
            other => BlockKind::Other(other.to_string()),
        }
    }

    /// Heading level for heading kinds.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Whether this version recognizes the kind.
    pub fn is_known(&self) -> bool {
        !matches!(self, BlockKind::Other(_))
    }

    /// Metadata for a freshly created block of this kind.
    ///
    /// Lists start with a single empty item; every other kind starts with
    /// empty metadata.
    pub fn default_metadata(&self) -> BlockMetadata {
        match self {
            BlockKind::List => BlockMetadata {
                items: Some(vec![String::new()]),
                ..BlockMetadata::default()
            },
            _ => BlockMetadata::default(),
        }
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BlockKind::parse(&s))
    }
}

/// Kind-specific block metadata.
///
/// `items` carries list entries; `url`/`alt`/`caption` carry image fields;
/// `url` alone carries a link target. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

impl BlockMetadata {
    /// Check if every field is absent.
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.alt.is_none() && self.caption.is_none() && self.items.is_none()
    }
}

/// One typed unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Opaque identifier, unique within the document.
    pub id: String,

    /// Block kind; immutable through `update_content`.
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Primary textual payload; meaning depends on the kind.
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "BlockMetadata::is_empty")]
    pub metadata: BlockMetadata,
}

impl Block {
    /// Create an empty block of the given kind with a fresh ID.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            metadata: kind.default_metadata(),
            kind,
            content: String::new(),
        }
    }

    /// Create a block with the given content.
    pub fn with_content(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(kind)
        }
    }
}

/// Direction for [`Document::move_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// An ordered, non-empty sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// A new document holding a single empty paragraph, matching the
    /// editor's initial state.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new(BlockKind::Paragraph)],
        }
    }

    /// Build a document from blocks, validating the non-empty and
    /// unique-ID invariants.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, DocumentError> {
        if blocks.is_empty() {
            return Err(DocumentError::MalformedDocument(
                "document must contain at least one block".to_string(),
            ));
        }

        for (i, block) in blocks.iter().enumerate() {
            if block.id.is_empty() {
                return Err(DocumentError::MalformedDocument(format!(
                    "block {i} has an empty id"
                )));
            }
            if blocks[..i].iter().any(|b| b.id == block.id) {
                return Err(DocumentError::MalformedDocument(format!(
                    "duplicate block id '{}'",
                    block.id
                )));
            }
        }

        Ok(Self { blocks })
    }

    /// Deserialize and validate a document from a JSON value.
    ///
    /// Anything that is not a non-empty array of well-shaped block objects
    /// with unique ids fails with [`DocumentError::MalformedDocument`].
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let blocks: Vec<Block> = serde_json::from_value(value)
            .map_err(|e| DocumentError::MalformedDocument(e.to_string()))?;
        Self::from_blocks(blocks)
    }

    /// Deserialize and validate a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let blocks: Vec<Block> = serde_json::from_str(json)
            .map_err(|e| DocumentError::MalformedDocument(e.to_string()))?;
        Self::from_blocks(blocks)
    }

    /// Serialize to a JSON value (an array of block objects).
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.blocks).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// The blocks in reading order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks. Always at least one.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API completeness alongside [`len`].
    ///
    /// [`len`]: Document::len
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Find a block by ID.
    pub fn get(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    fn position(&self, block_id: &str) -> Result<usize, DocumentError> {
        self.blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or(DocumentError::NotFound)
    }

    /// Insert a new empty block of `kind` immediately after `after_id`.
    ///
    /// Returns the new document and the ID of the created block.
    pub fn insert_after(
        &self,
        after_id: &str,
        kind: BlockKind,
    ) -> Result<(Self, String), DocumentError> {
        let index = self.position(after_id)?;
        let block = Block::new(kind);
        let id = block.id.clone();

        let mut blocks = self.blocks.clone();
        blocks.insert(index + 1, block);

        Ok((Self { blocks }, id))
    }

    /// Remove the identified block.
    ///
    /// Fails with [`DocumentError::InvariantViolation`] when the document
    /// holds a single block; it must never become empty.
    pub fn remove(&self, block_id: &str) -> Result<Self, DocumentError> {
        let index = self.position(block_id)?;

        if self.blocks.len() == 1 {
            return Err(DocumentError::InvariantViolation(
                "document must retain at least one block",
            ));
        }

        let mut blocks = self.blocks.clone();
        blocks.remove(index);

        Ok(Self { blocks })
    }

    /// Swap the identified block with its neighbor in `direction`.
    ///
    /// Moving the first block up or the last block down is a no-op, not an
    /// error: the returned document equals the input.
    pub fn move_block(&self, block_id: &str, direction: Direction) -> Result<Self, DocumentError> {
        let index = self.position(block_id)?;

        let target = match direction {
            Direction::Up => {
                if index == 0 {
                    return Ok(self.clone());
                }
                index - 1
            }
            Direction::Down => {
                if index + 1 == self.blocks.len() {
                    return Ok(self.clone());
                }
                index + 1
            }
        };

        let mut blocks = self.blocks.clone();
        blocks.swap(index, target);

        Ok(Self { blocks })
    }

    /// Replace the content and metadata of one block. The kind is
    /// immutable here; use [`change_kind`] to retype a block.
    ///
    /// [`change_kind`]: Document::change_kind
    pub fn update_content(
        &self,
        block_id: &str,
        content: impl Into<String>,
        metadata: BlockMetadata,
    ) -> Result<Self, DocumentError> {
        let index = self.position(block_id)?;

        let mut blocks = self.blocks.clone();
        blocks[index].content = content.into();
        blocks[index].metadata = metadata;

        Ok(Self { blocks })
    }

    /// Retype a block, resetting its metadata to the new kind's defaults.
    /// Content carries over.
    pub fn change_kind(&self, block_id: &str, kind: BlockKind) -> Result<Self, DocumentError> {
        let index = self.position(block_id)?;

        let mut blocks = self.blocks.clone();
        blocks[index].metadata = kind.default_metadata();
        blocks[index].kind = kind;

        Ok(Self { blocks })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let blocks = Vec::<Block>::deserialize(deserializer)?;
        Self::from_blocks(blocks).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with(kinds: &[BlockKind]) -> Document {
        let blocks = kinds
            .iter()
            .map(|k| Block::new(k.clone()))
            .collect::<Vec<_>>();
        Document::from_blocks(blocks).unwrap()
    }

    #[test]
    fn new_document_holds_one_paragraph() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
        assert!(doc.blocks()[0].content.is_empty());
    }

    #[test]
    fn insert_after_places_block_immediately_after_anchor() {
        let doc = doc_with(&[BlockKind::Paragraph, BlockKind::Quote]);
        let anchor = doc.blocks()[0].id.clone();

        let (doc2, new_id) = doc.insert_after(&anchor, BlockKind::Code).unwrap();

        assert_eq!(doc2.len(), 3);
        assert_eq!(doc2.blocks()[1].id, new_id);
        assert_eq!(doc2.blocks()[1].kind, BlockKind::Code);
        assert_eq!(doc2.blocks()[2].kind, BlockKind::Quote);
        // Input document is untouched.
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn insert_after_missing_anchor_is_not_found() {
        let doc = Document::new();
        assert_eq!(
            doc.insert_after("no-such-block", BlockKind::Paragraph)
                .unwrap_err(),
            DocumentError::NotFound
        );
    }

    #[test]
    fn new_list_block_starts_with_one_empty_item() {
        let doc = Document::new();
        let anchor = doc.blocks()[0].id.clone();

        let (doc2, new_id) = doc.insert_after(&anchor, BlockKind::List).unwrap();
        let list = doc2.get(&new_id).unwrap();

        assert_eq!(list.metadata.items, Some(vec![String::new()]));
        assert!(list.content.is_empty());
    }

    #[test]
    fn remove_refuses_to_empty_the_document() {
        let doc = Document::new();
        let only = doc.blocks()[0].id.clone();

        assert!(matches!(
            doc.remove(&only).unwrap_err(),
            DocumentError::InvariantViolation(_)
        ));
    }

    #[test]
    fn remove_missing_block_is_not_found() {
        let doc = doc_with(&[BlockKind::Paragraph, BlockKind::Quote]);
        assert_eq!(doc.remove("absent").unwrap_err(), DocumentError::NotFound);
    }

    #[test]
    fn remove_drops_exactly_the_named_block() {
        let doc = doc_with(&[BlockKind::Paragraph, BlockKind::Quote, BlockKind::Code]);
        let middle = doc.blocks()[1].id.clone();

        let doc2 = doc.remove(&middle).unwrap();

        assert_eq!(doc2.len(), 2);
        assert_eq!(doc2.blocks()[0].kind, BlockKind::Paragraph);
        assert_eq!(doc2.blocks()[1].kind, BlockKind::Code);
    }

    #[test]
    fn document_never_empties_under_insert_remove_sequences() {
        let mut doc = Document::new();

        for _ in 0..5 {
            let anchor = doc.blocks()[0].id.clone();
            let (next, _) = doc.insert_after(&anchor, BlockKind::Paragraph).unwrap();
            doc = next;
        }

        // Remove blocks until only one remains, then confirm the floor.
        while doc.len() > 1 {
            let id = doc.blocks()[0].id.clone();
            doc = doc.remove(&id).unwrap();
        }

        assert_eq!(doc.len(), 1);
        let last = doc.blocks()[0].id.clone();
        assert!(doc.remove(&last).is_err());
    }

    #[test]
    fn move_up_swaps_with_previous() {
        let doc = doc_with(&[BlockKind::Paragraph, BlockKind::Quote]);
        let second = doc.blocks()[1].id.clone();

        let doc2 = doc.move_block(&second, Direction::Up).unwrap();

        assert_eq!(doc2.blocks()[0].id, second);
        assert_eq!(doc2.blocks()[0].kind, BlockKind::Quote);
    }

    #[test]
    fn boundary_moves_are_no_ops() {
        let doc = doc_with(&[BlockKind::Paragraph, BlockKind::Quote]);
        let first = doc.blocks()[0].id.clone();
        let last = doc.blocks()[1].id.clone();

        assert_eq!(doc.move_block(&first, Direction::Up).unwrap(), doc);
        assert_eq!(doc.move_block(&last, Direction::Down).unwrap(), doc);
    }

    #[test]
    fn move_missing_block_is_not_found() {
        let doc = Document::new();
        assert_eq!(
            doc.move_block("absent", Direction::Up).unwrap_err(),
            DocumentError::NotFound
        );
    }

    #[test]
    fn update_content_keeps_kind() {
        let doc = Document::new();
        let id = doc.blocks()[0].id.clone();

        let doc2 = doc
            .update_content(&id, "hello", BlockMetadata::default())
            .unwrap();

        assert_eq!(doc2.blocks()[0].content, "hello");
        assert_eq!(doc2.blocks()[0].kind, BlockKind::Paragraph);
    }

    #[test]
    fn change_kind_resets_metadata_to_new_defaults() {
        let doc = Document::new();
        let id = doc.blocks()[0].id.clone();

        let doc2 = doc
            .update_content(
                &id,
                "text",
                BlockMetadata {
                    url: Some("https://example.com/a.png".to_string()),
                    ..BlockMetadata::default()
                },
            )
            .unwrap();

        let doc3 = doc2.change_kind(&id, BlockKind::List).unwrap();
        let block = doc3.get(&id).unwrap();

        assert_eq!(block.kind, BlockKind::List);
        assert_eq!(block.metadata.items, Some(vec![String::new()]));
        assert_eq!(block.metadata.url, None);
        // Content carries over.
        assert_eq!(block.content, "text");
    }

    #[test]
    fn spec_example_insert_then_move() {
        // [{paragraph "A"}] -> insert heading1 -> move it up.
        let para = Block::with_content(BlockKind::Paragraph, "A");
        let id0 = para.id.clone();
        let doc = Document::from_blocks(vec![para]).unwrap();

        let (doc2, id1) = doc.insert_after(&id0, BlockKind::Heading1).unwrap();
        assert_eq!(doc2.blocks()[0].content, "A");
        assert_eq!(doc2.blocks()[1].kind, BlockKind::Heading1);
        assert!(doc2.blocks()[1].content.is_empty());

        let doc3 = doc2.move_block(&id1, Direction::Up).unwrap();
        assert_eq!(doc3.blocks()[0].kind, BlockKind::Heading1);
        assert_eq!(doc3.blocks()[1].content, "A");
    }

    #[test]
    fn round_trip_is_lossless_for_every_kind() {
        let blocks = vec![
            Block::with_content(BlockKind::Paragraph, "body text"),
            Block::with_content(BlockKind::Heading1, "title"),
            Block::with_content(BlockKind::Heading2, "section"),
            Block::with_content(BlockKind::Heading3, "subsection"),
            Block {
                metadata: BlockMetadata {
                    items: Some(vec!["one".to_string(), "two".to_string()]),
                    ..BlockMetadata::default()
                },
                ..Block::new(BlockKind::List)
            },
            Block::with_content(BlockKind::Quote, "famous words"),
            Block::with_content(BlockKind::Code, "fn main() {}"),
            Block {
                metadata: BlockMetadata {
                    url: Some("https://example.com/p.jpg".to_string()),
                    alt: Some("a photo".to_string()),
                    caption: Some("the caption".to_string()),
                    items: None,
                },
                ..Block::new(BlockKind::Image)
            },
            Block {
                content: "click here".to_string(),
                metadata: BlockMetadata {
                    url: Some("https://example.com".to_string()),
                    ..BlockMetadata::default()
                },
                ..Block::new(BlockKind::Link)
            },
        ];
        let doc = Document::from_blocks(blocks).unwrap();

        let restored = Document::from_value(doc.to_value()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn unknown_kind_round_trips_and_stays_other() {
        let value = json!([
            { "id": "b1", "type": "paragraph", "content": "hi" },
            { "id": "b2", "type": "carousel", "content": "", "metadata": { "url": "https://example.com" } }
        ]);

        let doc = Document::from_value(value.clone()).unwrap();
        assert_eq!(
            doc.blocks()[1].kind,
            BlockKind::Other("carousel".to_string())
        );
        assert!(!doc.blocks()[1].kind.is_known());

        assert_eq!(doc.to_value(), value);
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        // Not an array.
        assert!(matches!(
            Document::from_value(json!({"blocks": []})).unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Empty array.
        assert!(matches!(
            Document::from_value(json!([])).unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Element is not an object.
        assert!(matches!(
            Document::from_value(json!(["paragraph"])).unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Missing id.
        assert!(matches!(
            Document::from_value(json!([{ "type": "paragraph", "content": "x" }])).unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Mistyped content.
        assert!(matches!(
            Document::from_value(json!([{ "id": "b1", "type": "paragraph", "content": 7 }]))
                .unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Duplicate ids.
        assert!(matches!(
            Document::from_value(json!([
                { "id": "b1", "type": "paragraph", "content": "a" },
                { "id": "b1", "type": "quote", "content": "b" }
            ]))
            .unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
        // Empty id.
        assert!(matches!(
            Document::from_value(json!([{ "id": "", "type": "paragraph", "content": "a" }]))
                .unwrap_err(),
            DocumentError::MalformedDocument(_)
        ));
    }

    #[test]
    fn from_json_parses_the_wire_shape() {
        let json = r#"[
            { "id": "a", "type": "heading1", "content": "Title" },
            { "id": "b", "type": "list", "content": "", "metadata": { "items": ["x", "y"] } }
        ]"#;

        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].kind.heading_level(), Some(1));
        assert_eq!(
            doc.blocks()[1].metadata.items,
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn serde_deserialize_enforces_document_invariants() {
        let err = serde_json::from_str::<Document>("[]").unwrap_err();
        assert!(err.to_string().contains("at least one block"));
    }
}
