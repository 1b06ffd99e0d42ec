//! Structured references extracted from document bodies.
//!
//! All line numbers are 1-based and count from the first line of the raw
//! document, frontmatter included, so they can be reported as-is.

use serde::Serialize;

/// Loosely-typed frontmatter mapping.
///
/// Callers probe arbitrary keys (`title`, `weight`, translation markers)
/// without a shared schema, so values stay as JSON values.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

/// An image referenced from a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    /// Target path or URL exactly as written.
    pub target: String,
    /// Alt text or caption, when present and non-empty.
    pub alt: Option<String>,
    pub line: usize,
    /// `true` for scheme-qualified targets (`https://...`, `//cdn/...`).
    pub remote: bool,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Declared language tag (first word of the info string).
    pub language: Option<String>,
    pub content: String,
    /// Line of the opening fence.
    pub line: usize,
}

/// A hyperlink target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRef {
    pub target: String,
    /// Visible link text.
    pub text: String,
    pub line: usize,
}
