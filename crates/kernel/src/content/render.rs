//! Server-side rendering of block documents.
//!
//! Converts a [`Document`] into semantic HTML:
//! - Paragraph, heading 1–3, list, quote, code, image, link
//! - Text is sanitized with ammonia; URLs and attributes are HTML-escaped
//! - Code renders as an escaped monospace literal
//! - Unknown block kinds render nothing

use crate::content::document::{Block, BlockKind, Document};
use crate::routes::helpers::html_escape;

/// Sanitize user-provided rich text, allowing only safe inline HTML.
///
/// Uses ammonia to strip dangerous tags/attributes while preserving
/// basic formatting tags (`<b>`, `<i>`, `<a>`, `<br>`, etc.).
fn sanitize_text(input: &str) -> String {
    ammonia::clean(input)
}

/// Validate that a URL uses a safe scheme (http or https).
fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.starts_with("https://") || trimmed.starts_with("http://")
}

/// Render a document into a single HTML string.
///
/// Blocks render in reading order; unrecognized kinds are silently skipped.
pub fn render_document(doc: &Document) -> String {
    let mut html = String::new();
    for block in doc.blocks() {
        html.push_str(&render_block(block));
    }
    html
}

fn render_block(block: &Block) -> String {
    match &block.kind {
        BlockKind::Paragraph => render_paragraph(block),
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => render_heading(block),
        BlockKind::List => render_list(block),
        BlockKind::Quote => render_quote(block),
        BlockKind::Code => render_code(block),
        BlockKind::Image => render_image(block),
        BlockKind::Link => render_link(block),
        BlockKind::Other(_) => String::new(),
    }
}

fn render_paragraph(block: &Block) -> String {
    format!("<p>{}</p>", sanitize_text(&block.content))
}

fn render_heading(block: &Block) -> String {
    // Only heading kinds reach this; default defensively to level 2.
    let level = block.kind.heading_level().unwrap_or(2);
    let clean = sanitize_text(&block.content);
    format!("<h{level}>{clean}</h{level}>")
}

/// Render list items as an unordered bullet sequence.
fn render_list(block: &Block) -> String {
    let mut html = String::from("<ul>");
    if let Some(items) = &block.metadata.items {
        for item in items {
            html.push_str(&format!("<li>{}</li>", sanitize_text(item)));
        }
    }
    html.push_str("</ul>");
    html
}

fn render_quote(block: &Block) -> String {
    format!(
        "<blockquote><p>{}</p></blockquote>",
        sanitize_text(&block.content)
    )
}

/// Render a code block as an escaped monospace literal. No syntax
/// highlighting.
fn render_code(block: &Block) -> String {
    format!("<pre><code>{}</code></pre>", html_escape(&block.content))
}

/// Render an image with a figure/figcaption wrapper.
///
/// Images without a URL render nothing.
fn render_image(block: &Block) -> String {
    let url = block.metadata.url.as_deref().unwrap_or("");
    if url.is_empty() {
        return String::new();
    }

    let alt = block.metadata.alt.as_deref().unwrap_or("");
    let escaped_url = html_escape(url);
    let escaped_alt = html_escape(alt);

    let mut html = format!("<figure><img src=\"{escaped_url}\" alt=\"{escaped_alt}\">");
    if let Some(caption) = block.metadata.caption.as_deref()
        && !caption.is_empty()
    {
        html.push_str(&format!("<figcaption>{}</figcaption>", html_escape(caption)));
    }
    html.push_str("</figure>");
    html
}

/// Render a link as an anchor: text from `content`, target from
/// `metadata.url`.
///
/// A missing or non-http(s) URL falls back to the `#` placeholder so a
/// `javascript:` target never reaches an href.
fn render_link(block: &Block) -> String {
    let url = block.metadata.url.as_deref().unwrap_or("");
    let href = if !url.is_empty() && is_safe_url(url) {
        html_escape(url)
    } else {
        "#".to_string()
    };

    format!(
        "<p><a href=\"{href}\">{}</a></p>",
        sanitize_text(&block.content)
    )
}
