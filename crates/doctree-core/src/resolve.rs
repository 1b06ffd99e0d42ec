//! Tree-only link and image resolution.
//!
//! [`resolve_link`] maps a reference written inside a document to a node of
//! the [`ContentTree`] without touching any filesystem. Logical paths and
//! store paths may diverge, so resolving against the tree is what keeps
//! navigation and validation independent of the backing store.
//!
//! # Algorithm
//!
//! 1. Strip the `#fragment` (and `?query`). Fragment-only references fail.
//! 2. Absolute references (`/a/b`) start at the root; relative ones start
//!    at the directory containing the referring document.
//! 3. Apply `.` and `..` segments (`..` clamps at the root).
//! 4. Strip a document extension (`.md`, `.markdown`, `.mdx`) and then a
//!    trailing language tag, so `tutorial`, `tutorial.md`, and
//!    `tutorial.en.md` all land on logical path `tutorial`.
//! 5. A reference that names a directory (including a trailing `/`)
//!    resolves to that directory's index document, or fails without one.
//! 6. Look the candidate up in the tree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::metadata::is_remote;
use crate::path::{join, normalize_onto, parent_of, split_segments, DOC_EXTENSIONS};
use crate::tree::{ContentTree, NodeId};

static SPECIAL_SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(mailto|tel|data|javascript|ftp|irc|news|sms):").expect("valid scheme regex")
});

/// How a raw reference should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `#section` or empty: not a target.
    Fragment,
    /// Scheme-qualified or protocol-relative URL.
    Remote(&'a str),
    /// `mailto:`, `tel:`, `data:` and similar; never checked.
    Special,
    /// Local path with fragment and query removed.
    Local(&'a str),
}

/// Classify a raw reference string.
pub fn classify_reference(raw: &str) -> Reference<'_> {
    let trimmed = raw.trim();
    if is_remote(trimmed) {
        return Reference::Remote(trimmed);
    }
    if SPECIAL_SCHEME_RE.is_match(trimmed) {
        return Reference::Special;
    }
    match strip_fragment(trimmed) {
        "" => Reference::Fragment,
        path => Reference::Local(path),
    }
}

/// Drop everything from the first `#` or `?`.
pub fn strip_fragment(reference: &str) -> &str {
    match reference.find(['#', '?']) {
        Some(pos) => &reference[..pos],
        None => reference,
    }
}

/// Resolve `reference` as written in the document at `from` (a logical
/// path) to a tree node.
///
/// Returns `None` for anything that does not resolve, including remote
/// URLs and fragment-only references. Callers treat `None` as
/// "unresolved" and may fall back to other oracles.
///
/// ```rust
/// use doctree_core::ContentTree;
/// use doctree_core::resolve::resolve_link;
///
/// let mut tree = ContentTree::new("en", "en");
/// let target = tree.ingest("docs/tutorial.md", "# Tutorial").unwrap();
/// tree.ingest("docs/guide.md", "# Guide").unwrap();
///
/// assert_eq!(resolve_link(&tree, "./tutorial.en.md", "docs/guide"), target);
/// ```
pub fn resolve_link(tree: &ContentTree, reference: &str, from: &str) -> Option<NodeId> {
    let target = match classify_reference(reference) {
        Reference::Local(path) => path,
        _ => return None,
    };

    let base = if target.starts_with('/') {
        Vec::new()
    } else {
        split_segments(parent_of(from.trim_matches('/')))
    };
    let names_directory = target.ends_with('/') || target.ends_with("/.") || target.ends_with("..");
    let segments = normalize_onto(&base, target);

    if names_directory || segments.is_empty() {
        let dir = tree.lookup(&segments.join("/"))?;
        return tree.index_of(dir);
    }

    let (last, rest) = segments.split_last()?;
    let dir = rest.join("/");
    candidate_names(last)
        .into_iter()
        .find_map(|name| tree.lookup(&join(&dir, &name)))
        .and_then(|id| match tree.get(id) {
            Some(node) if node.is_directory() => tree.index_of(id),
            Some(_) => Some(id),
            None => None,
        })
}

/// Logical names a final path segment may refer to, most specific first.
fn candidate_names(segment: &str) -> Vec<String> {
    let stem = DOC_EXTENSIONS.iter().find_map(|ext| {
        segment
            .strip_suffix(ext)
            .and_then(|s| s.strip_suffix('.'))
            .filter(|s| !s.is_empty())
    });

    match stem {
        Some(stem) => {
            let mut names = vec![stem.to_string()];
            if let Some((base, _language)) = stem.rsplit_once('.') {
                if !base.is_empty() {
                    names.push(base.to_string());
                }
            }
            names
        }
        None => vec![segment.to_string()],
    }
}

/// Physical store path a local reference points at, for existence probes
/// that run after tree resolution failed.
///
/// Relative references are applied to the directory of `source_path`;
/// absolute ones to the store root.
pub fn physical_candidate(source_path: &str, reference_path: &str) -> String {
    let source = source_path.replace('\\', "/");
    let base = if reference_path.starts_with('/') {
        Vec::new()
    } else {
        split_segments(parent_of(&source))
    };
    normalize_onto(&base, reference_path).join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ContentTree {
        let mut tree = ContentTree::new("en", "en");
        tree.ingest("docs/index.md", "# Docs").unwrap();
        tree.ingest("docs/guide.md", "# Guide").unwrap();
        tree.ingest("docs/tutorial.md", "# Tutorial").unwrap();
        tree.ingest("docs/v1.2.en.md", "# Release").unwrap();
        tree.ingest("api/reference.md", "# Reference").unwrap();
        tree.ingest("_index.md", "# Home").unwrap();
        tree
    }

    #[test]
    fn test_three_spellings_resolve_identically() {
        let tree = sample_tree();
        let expected = tree.lookup("docs/tutorial");
        assert!(expected.is_some());
        for reference in ["./tutorial", "./tutorial.md", "./tutorial.en.md", "tutorial.md#step-2"] {
            assert_eq!(resolve_link(&tree, reference, "docs/guide"), expected, "{reference}");
        }
    }

    #[test]
    fn test_directory_reference_resolves_to_index() {
        let tree = sample_tree();
        assert_eq!(resolve_link(&tree, "/docs/", "api/reference"), tree.lookup("docs/index"));
        assert_eq!(resolve_link(&tree, "../docs", "api/reference"), tree.lookup("docs/index"));
        assert_eq!(resolve_link(&tree, "/api/", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "/", "docs/guide"), tree.lookup("_index"));
        assert_eq!(resolve_link(&tree, "..", "docs/guide"), tree.lookup("_index"));
    }

    #[test]
    fn test_relative_and_absolute() {
        let tree = sample_tree();
        let reference = tree.lookup("api/reference");
        assert_eq!(resolve_link(&tree, "../api/reference.md", "docs/guide"), reference);
        assert_eq!(resolve_link(&tree, "/api/reference", "docs/guide"), reference);
        assert_eq!(resolve_link(&tree, "../../../api/reference", "docs/guide"), reference);
        assert_eq!(resolve_link(&tree, "api/reference", "docs/guide"), None);
    }

    #[test]
    fn test_dotted_names_prefer_exact_match() {
        let tree = sample_tree();
        assert_eq!(resolve_link(&tree, "v1.2.md", "docs/guide"), tree.lookup("docs/v1.2"));
    }

    #[test]
    fn test_unresolvable_references() {
        let tree = sample_tree();
        assert_eq!(resolve_link(&tree, "#top", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "https://example.com/docs/", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "mailto:a@b.c", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "./missing.md", "docs/guide"), None);
        assert_eq!(resolve_link(&tree, "./img/logo.png", "docs/guide"), None);
    }

    #[test]
    fn test_classify_reference() {
        assert_eq!(classify_reference("#x"), Reference::Fragment);
        assert_eq!(classify_reference("  "), Reference::Fragment);
        assert_eq!(classify_reference("https://a.b/c"), Reference::Remote("https://a.b/c"));
        assert_eq!(classify_reference("//cdn.b/c.png"), Reference::Remote("//cdn.b/c.png"));
        assert_eq!(classify_reference("data:image/png;base64,xx"), Reference::Special);
        assert_eq!(classify_reference("a.md?x=1#y"), Reference::Local("a.md"));
    }

    #[test]
    fn test_physical_candidate() {
        assert_eq!(physical_candidate("docs/guide.en.md", "./img/a.png"), "docs/img/a.png");
        assert_eq!(physical_candidate("docs/guide.md", "../static/a.png"), "static/a.png");
        assert_eq!(physical_candidate("docs/guide.md", "/static/a.png"), "static/a.png");
        assert_eq!(physical_candidate("docs\\guide.md", "a.png"), "docs/a.png");
    }
}
