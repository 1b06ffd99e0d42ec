//! Document path parsing.
//!
//! Turns a store path such as `docs/guide/intro.fr.md` into the pieces the
//! tree needs: base name (`intro`), language tag (`fr`), parent directory
//! (`docs/guide`), and whether the document is an index document.
//!
//! Parsing never fails. In the worst case the whole stem becomes the base
//! name and the default language applies.

/// Stems that mark a document as its directory's index document.
pub const INDEX_NAMES: [&str; 2] = ["index", "_index"];

/// Extensions recognised as document files when stripping references.
pub const DOC_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdx"];

/// Result of [`parse_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Base name without language suffix or extension.
    pub name: String,
    /// Language tag from the file name, or the default language.
    pub language: String,
    /// Slash-separated parent directory; empty for top-level documents.
    pub parent: String,
    /// `true` when [`name`](Self::name) is one of [`INDEX_NAMES`].
    pub is_index: bool,
    /// File extension without the dot, if any.
    pub extension: Option<String>,
}

impl ParsedPath {
    /// Logical path used as the tree lookup key (`parent/name`).
    pub fn logical_path(&self) -> String {
        join(&self.parent, &self.name)
    }
}

/// Parse a document path into name, language, parent, and index flag.
///
/// Backslashes are treated as separators and leading `./` or `/` are
/// dropped, so paths coming from different stores land on the same
/// logical path.
///
/// ```rust
/// use doctree_core::path::parse_path;
///
/// let p = parse_path("docs/intro.fr.md", "en");
/// assert_eq!(p.name, "intro");
/// assert_eq!(p.language, "fr");
/// assert_eq!(p.parent, "docs");
/// assert!(!p.is_index);
/// ```
pub fn parse_path(path: &str, default_language: &str) -> ParsedPath {
    let segments = split_segments(path);
    let (parent_segments, file) = match segments.split_last() {
        Some((last, rest)) => (rest, *last),
        None => (&[][..], ""),
    };

    let (stem, extension) = match file.rfind('.') {
        Some(pos) if pos > 0 => (&file[..pos], Some(file[pos + 1..].to_string())),
        _ => (file, None),
    };

    let (name, language) = match stem.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < stem.len() => (&stem[..pos], &stem[pos + 1..]),
        _ => (stem, default_language),
    };

    ParsedPath {
        name: name.to_string(),
        language: language.to_string(),
        parent: parent_segments.join("/"),
        is_index: INDEX_NAMES.contains(&name),
        extension,
    }
}

/// Split a path on `/` and `\`, dropping empty and `.` segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Apply `segments` (which may contain `.` and `..`) on top of `base`.
///
/// `..` above the root clamps at the root instead of failing.
pub fn normalize_onto(base: &[&str], reference: &str) -> Vec<String> {
    let mut out: Vec<String> = base.iter().map(|s| s.to_string()).collect();
    for segment in reference.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other.to_string()),
        }
    }
    out
}

/// Parent directory of a slash-separated path (`a/b/c` → `a/b`).
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Join two slash-separated path fragments, skipping an empty prefix.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
