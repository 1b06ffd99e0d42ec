//! Change detection between a source document and its translation.
//!
//! A translated document records the hash of the source text it was made
//! from under the [`SOURCE_HASH_KEY`] frontmatter key. Comparing that
//! marker with the source node's current hash tells whether the source
//! changed since the translation was last written.

use serde::Serialize;

use crate::tree::Node;

/// Frontmatter key holding the source hash a translation was made from.
pub const SOURCE_HASH_KEY: &str = "source_hash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    /// No document at the same logical path in the target tree.
    Missing,
    /// The marker is absent or does not match the source hash.
    Stale,
    Current,
}

/// Compare a source document with its (optional) translated counterpart.
pub fn translation_status(source: &Node, translated: Option<&Node>) -> TranslationStatus {
    let Some(translated) = translated else {
        return TranslationStatus::Missing;
    };
    let marker = translated
        .frontmatter
        .get(SOURCE_HASH_KEY)
        .and_then(|v| v.as_str());
    match (marker, source.hash.as_deref()) {
        (Some(marker), Some(hash)) if marker == hash => TranslationStatus::Current,
        _ => TranslationStatus::Stale,
    }
}
