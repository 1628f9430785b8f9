//! Integration tests for the block document model.
//!
//! These exercise the document value type end to end: editing operations,
//! invariants, serialization, and rendering.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use piazza_kernel::content::{
    Block, BlockKind, BlockMetadata, Direction, Document, DocumentError, render_document,
};
use serde_json::json;

// ============================================================================
// Editing session scenarios
// ============================================================================

#[test]
fn editing_session_builds_expected_document() {
    // Start from the editor's initial state and build a small article.
    let doc = Document::new();
    let first = doc.blocks()[0].id.clone();

    let doc = doc
        .update_content(&first, "Welcome to my blog.", BlockMetadata::default())
        .unwrap();

    let (doc, heading_id) = doc.insert_after(&first, BlockKind::Heading1).unwrap();
    let doc = doc
        .update_content(&heading_id, "Hello", BlockMetadata::default())
        .unwrap();

    // Headings belong above the intro paragraph.
    let doc = doc.move_block(&heading_id, Direction::Up).unwrap();

    let (doc, list_id) = doc.insert_after(&first, BlockKind::List).unwrap();
    let doc = doc
        .update_content(
            &list_id,
            "",
            BlockMetadata {
                items: Some(vec!["one".to_string(), "two".to_string()]),
                ..BlockMetadata::default()
            },
        )
        .unwrap();

    let kinds: Vec<&str> = doc.blocks().iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, ["heading1", "paragraph", "list"]);

    let html = render_document(&doc);
    assert_eq!(
        html,
        "<h1>Hello</h1><p>Welcome to my blog.</p><ul><li>one</li><li>two</li></ul>"
    );
}

#[test]
fn undo_style_editing_leaves_prior_values_intact() {
    // Operations return new values; holding the old document is all an
    // undo stack needs.
    let v0 = Document::new();
    let id = v0.blocks()[0].id.clone();

    let v1 = v0
        .update_content(&id, "draft one", BlockMetadata::default())
        .unwrap();
    let v2 = v1
        .update_content(&id, "draft two", BlockMetadata::default())
        .unwrap();

    assert_eq!(v0.blocks()[0].content, "");
    assert_eq!(v1.blocks()[0].content, "draft one");
    assert_eq!(v2.blocks()[0].content, "draft two");
}

#[test]
fn remove_then_insert_keeps_document_non_empty() {
    let doc = Document::new();
    let only = doc.blocks()[0].id.clone();

    // The last block cannot be removed...
    let err = doc.remove(&only).unwrap_err();
    assert!(matches!(err, DocumentError::InvariantViolation(_)));

    // ...but after growing the document the original can go.
    let (doc, _new_id) = doc.insert_after(&only, BlockKind::Quote).unwrap();
    let doc = doc.remove(&only).unwrap();

    assert_eq!(doc.len(), 1);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Quote);
}

#[test]
fn change_kind_is_the_only_way_to_retype() {
    let doc = Document::new();
    let id = doc.blocks()[0].id.clone();

    // update_content never changes the kind.
    let doc = doc
        .update_content(
            &id,
            "text",
            BlockMetadata {
                url: Some("https://example.com".to_string()),
                ..BlockMetadata::default()
            },
        )
        .unwrap();
    assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);

    let doc = doc.change_kind(&id, BlockKind::Link).unwrap();
    assert_eq!(doc.blocks()[0].kind, BlockKind::Link);
    // Metadata reset to link defaults (empty).
    assert_eq!(doc.blocks()[0].metadata, BlockMetadata::default());
}

// ============================================================================
// Serialization contract
// ============================================================================

#[test]
fn wire_shape_matches_the_editor_format() {
    let doc = Document::from_json(
        r#"[
            { "id": "1", "type": "paragraph", "content": "Hello" },
            { "id": "2", "type": "image", "content": "",
              "metadata": { "url": "https://example.com/p.jpg", "alt": "pic", "caption": "cap" } }
        ]"#,
    )
    .unwrap();

    let value = doc.to_value();
    assert_eq!(value[0]["type"], "paragraph");
    assert_eq!(value[0]["content"], "Hello");
    assert_eq!(value[1]["metadata"]["url"], "https://example.com/p.jpg");
    // Empty metadata is omitted, absent metadata stays absent.
    assert!(value[0].get("metadata").is_none());
}

#[test]
fn round_trip_preserves_block_order() {
    let blocks = vec![
        Block::with_content(BlockKind::Heading2, "b"),
        Block::with_content(BlockKind::Paragraph, "a"),
        Block::with_content(BlockKind::Code, "c"),
    ];
    let doc = Document::from_blocks(blocks).unwrap();

    let json = serde_json::to_string(&doc).unwrap();
    let restored: Document = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, doc);
    let kinds: Vec<&str> = restored.blocks().iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, ["heading2", "paragraph", "code"]);
}

#[test]
fn hand_edited_garbage_is_rejected_not_swallowed() {
    for bad in [
        json!("a string"),
        json!(42),
        json!({}),
        json!([]),
        json!([null]),
        json!([{ "type": "paragraph" }]),
        json!([{ "id": 7, "type": "paragraph", "content": "x" }]),
        json!([{ "id": "a", "type": "list", "content": "", "metadata": { "items": "not-a-list" } }]),
    ] {
        assert!(
            matches!(
                Document::from_value(bad.clone()),
                Err(DocumentError::MalformedDocument(_))
            ),
            "expected MalformedDocument for {bad}"
        );
    }
}

#[test]
fn unknown_kinds_survive_round_trip_and_render_nothing() {
    let value = json!([
        { "id": "a", "type": "paragraph", "content": "before" },
        { "id": "b", "type": "table", "content": "", "metadata": { "items": ["r1", "r2"] } },
        { "id": "c", "type": "paragraph", "content": "after" }
    ]);

    let doc = Document::from_value(value.clone()).unwrap();
    assert_eq!(doc.to_value(), value);
    assert_eq!(render_document(&doc), "<p>before</p><p>after</p>");
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn full_document_renders_every_known_kind() {
    let doc = Document::from_json(
        r#"[
            { "id": "1", "type": "heading1", "content": "Title" },
            { "id": "2", "type": "heading2", "content": "Sub" },
            { "id": "3", "type": "heading3", "content": "Subsub" },
            { "id": "4", "type": "paragraph", "content": "Body" },
            { "id": "5", "type": "list", "content": "", "metadata": { "items": ["x"] } },
            { "id": "6", "type": "quote", "content": "Said" },
            { "id": "7", "type": "code", "content": "let x = 1;" },
            { "id": "8", "type": "image", "content": "",
              "metadata": { "url": "https://example.com/i.png", "alt": "i" } },
            { "id": "9", "type": "link", "content": "here",
              "metadata": { "url": "https://example.com" } }
        ]"#,
    )
    .unwrap();

    let html = render_document(&doc);
    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("<h2>Sub</h2>"));
    assert!(html.contains("<h3>Subsub</h3>"));
    assert!(html.contains("<p>Body</p>"));
    assert!(html.contains("<li>x</li>"));
    assert!(html.contains("<blockquote>"));
    assert!(html.contains("<pre><code>let x = 1;</code></pre>"));
    assert!(html.contains("<img src=\"https://example.com/i.png\""));
    assert!(html.contains("<a href=\"https://example.com\">here</a>"));
}

#[test]
fn rendering_is_xss_safe_across_block_kinds() {
    let payload = "<script>alert('xss')</script>";
    let doc = Document::from_value(json!([
        { "id": "1", "type": "paragraph", "content": payload },
        { "id": "2", "type": "heading1", "content": payload },
        { "id": "3", "type": "quote", "content": payload },
        { "id": "4", "type": "code", "content": payload },
        { "id": "5", "type": "list", "content": "", "metadata": { "items": [payload] } },
        { "id": "6", "type": "image", "content": "",
          "metadata": { "url": "https://example.com/x.png", "alt": payload, "caption": payload } },
        { "id": "7", "type": "link", "content": payload,
          "metadata": { "url": "javascript:alert('xss')" } }
    ]))
    .unwrap();

    let html = render_document(&doc);
    assert!(!html.contains("<script>"));
    assert!(!html.contains("javascript:"));
}
