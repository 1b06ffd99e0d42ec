//! Per-document metadata extraction.
//!
//! [`extract`] turns raw document text into everything the tree stores
//! about a document besides its path:
//!
//! - **Frontmatter**: a leading `---` YAML block, parsed into a loose
//!   key-value mapping. Malformed YAML is logged and treated as empty.
//! - **Weight**: `weight`, else `sidebar_position`, else [`DEFAULT_WEIGHT`].
//! - **Hash**: SHA-256 hex of the exact raw bytes, for change detection.
//! - **Title**: frontmatter `title`, else the first level-1 heading.
//! - **References**: images (markdown syntax, `figure` shortcodes, and raw
//!   `<img>` tags), fenced code blocks, and hyperlink targets, collected in
//!   a single pass over the parsed body.
//!
//! Images and links are de-duplicated by target; the first occurrence in
//! document order wins.

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::models::{CodeBlock, Frontmatter, ImageRef, LinkRef};

/// Weight given to documents and directories that declare none.
///
/// Sorts after any explicit weight a document is likely to declare.
pub const DEFAULT_WEIGHT: i64 = 999;

/// Effective weight of every index document.
pub const INDEX_WEIGHT: i64 = -1;

/// Frontmatter keys consulted for the ordering weight, in precedence order.
pub const WEIGHT_KEYS: [&str; 2] = ["weight", "sidebar_position"];

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme regex"));

static IMG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img tag regex"));

static FIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{\{[<%]\s*figure\b(.*?)[>%]\}\}").expect("valid figure regex")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)([a-z][a-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

/// Everything derived from a document's raw text.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub frontmatter: Frontmatter,
    /// Declared weight (before any index-document override).
    pub weight: i64,
    pub hash: String,
    pub images: Vec<ImageRef>,
    pub code_blocks: Vec<CodeBlock>,
    pub links: Vec<LinkRef>,
}

impl DocumentMetadata {
    /// The `title` frontmatter value, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.frontmatter.get("title").and_then(Value::as_str)
    }
}

/// Extract frontmatter, weight, hash, title, and body references.
pub fn extract(text: &str) -> DocumentMetadata {
    let (yaml, body, body_line) = split_frontmatter(text);
    let mut frontmatter = yaml.map(parse_frontmatter).unwrap_or_default();
    let weight = declared_weight(&frontmatter);

    let scan = scan_body(body, body_line);
    if !frontmatter.contains_key("title") {
        if let Some(title) = scan.title {
            frontmatter.insert("title".to_string(), Value::String(title));
        }
    }

    DocumentMetadata {
        frontmatter,
        weight,
        hash: content_hash(text),
        images: scan.images,
        code_blocks: scan.code_blocks,
        links: scan.links,
    }
}

/// Split a leading `---` frontmatter block off the document.
///
/// Returns `(yaml, body, body_line_offset)` where the offset is the number
/// of raw lines consumed by the block (zero when there is none). An
/// unterminated block is treated as ordinary body text.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str, usize) {
    let mut lines = text.split_inclusive('\n');
    let first = match lines.next() {
        Some(line) => line,
        None => return (None, text, 0),
    };
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return (None, text, 0);
    }

    let start = first.len();
    let mut offset = start;
    let mut consumed = 1;
    for line in lines {
        consumed += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return (Some(&text[start..offset]), &text[offset + line.len()..], consumed);
        }
        offset += line.len();
    }
    (None, text, 0)
}

/// Parse YAML frontmatter into a loose mapping.
pub fn parse_frontmatter(yaml: &str) -> Frontmatter {
    if yaml.trim().is_empty() {
        return Frontmatter::new();
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Frontmatter::new(),
        Ok(other) => {
            warn!(kind = value_kind(&other), "frontmatter is not a mapping; ignoring it");
            Frontmatter::new()
        }
        Err(e) => {
            warn!(error = %e, "malformed frontmatter; ignoring it");
            Frontmatter::new()
        }
    }
}

/// Ordering weight declared by the frontmatter.
pub fn declared_weight(frontmatter: &Frontmatter) -> i64 {
    WEIGHT_KEYS
        .iter()
        .find_map(|key| frontmatter.get(*key).and_then(weight_value))
        .unwrap_or(DEFAULT_WEIGHT)
}

fn weight_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// SHA-256 hex digest of the raw document bytes.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `true` for scheme-qualified (`https://...`) or protocol-relative
/// (`//host/...`) targets.
pub fn is_remote(target: &str) -> bool {
    target.starts_with("//") || SCHEME_RE.is_match(target)
}

/// Maps byte offsets in the body to 1-based raw-document line numbers.
struct LineIndex {
    starts: Vec<usize>,
    base: usize,
}

impl LineIndex {
    fn new(body: &str, base: usize) -> Self {
        let mut starts = vec![0];
        starts.extend(body.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts, base }
    }

    fn line_of(&self, offset: usize) -> usize {
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        idx + 1 + self.base
    }
}

#[derive(Default)]
struct BodyScan {
    title: Option<String>,
    images: Vec<ImageRef>,
    code_blocks: Vec<CodeBlock>,
    links: Vec<LinkRef>,
}

struct OpenImage {
    target: String,
    alt: String,
    offset: usize,
}

struct OpenLink {
    target: String,
    text: String,
    offset: usize,
}

fn scan_body(body: &str, body_line: usize) -> BodyScan {
    let lines = LineIndex::new(body, body_line);
    let mut scan = BodyScan::default();

    let mut images: Vec<(usize, ImageRef)> = Vec::new();
    let mut code_ranges: Vec<Range<usize>> = Vec::new();
    let mut links: Vec<OpenLink> = Vec::new();
    let mut link_stack: Vec<OpenLink> = Vec::new();
    let mut image: Option<OpenImage> = None;
    let mut heading: Option<String> = None;
    let mut code: Option<CodeBlock> = None;

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                if level == HeadingLevel::H1 && scan.title.is_none() {
                    heading = Some(String::new());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        scan.title = Some(text.to_string());
                    }
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                image = Some(OpenImage {
                    target: dest_url.to_string(),
                    alt: String::new(),
                    offset: range.start,
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(open) = image.take() {
                    if !open.target.is_empty() {
                        images.push((
                            open.offset,
                            image_ref(open.target, Some(open.alt), lines.line_of(open.offset)),
                        ));
                    }
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                ..
            }) => {
                let target = match link_type {
                    LinkType::Email => format!("mailto:{}", dest_url),
                    _ => dest_url.to_string(),
                };
                link_stack.push(OpenLink {
                    target,
                    text: String::new(),
                    offset: range.start,
                });
            }
            Event::End(TagEnd::Link) => {
                if let Some(open) = link_stack.pop() {
                    if !open.target.is_empty() {
                        links.push(open);
                    }
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                code_ranges.push(range.clone());
                if let CodeBlockKind::Fenced(info) = kind {
                    code = Some(CodeBlock {
                        language: info.split_whitespace().next().map(str::to_string),
                        content: String::new(),
                        line: lines.line_of(range.start),
                    });
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code.take() {
                    scan.code_blocks.push(block);
                }
            }
            Event::Text(text) => {
                if let Some(block) = code.as_mut() {
                    block.content.push_str(&text);
                } else {
                    push_inline_text(&text, &mut heading, &mut image, &mut link_stack);
                }
            }
            Event::Code(text) => {
                code_ranges.push(range.clone());
                push_inline_text(&text, &mut heading, &mut image, &mut link_stack);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                for m in IMG_TAG_RE.find_iter(&html) {
                    let attrs = attributes(m.as_str());
                    if let Some(src) = attrs.get("src") {
                        let offset = range.start + m.start();
                        let line = lines.line_of(range.start)
                            + html[..m.start()].matches('\n').count();
                        let image = image_ref(src.clone(), attrs.get("alt").cloned(), line);
                        images.push((offset, image));
                    }
                }
            }
            _ => {}
        }
    }

    for m in FIGURE_RE.find_iter(body) {
        if code_ranges.iter().any(|r| r.contains(&m.start())) {
            continue;
        }
        let attrs = attributes(m.as_str());
        if let Some(src) = attrs.get("src") {
            let caption = attrs.get("caption").or_else(|| attrs.get("alt")).cloned();
            images.push((m.start(), image_ref(src.clone(), caption, lines.line_of(m.start()))));
        }
    }

    images.sort_by_key(|(offset, _)| *offset);
    let mut seen = HashSet::new();
    scan.images = images
        .into_iter()
        .map(|(_, image)| image)
        .filter(|image| seen.insert(image.target.clone()))
        .collect();

    let mut seen = HashSet::new();
    scan.links = links
        .into_iter()
        .filter(|link| seen.insert(link.target.clone()))
        .map(|link| LinkRef {
            line: lines.line_of(link.offset),
            target: link.target,
            text: link.text.trim().to_string(),
        })
        .collect();

    scan
}

/// Route inline text to whichever open element is collecting it.
fn push_inline_text(
    text: &str,
    heading: &mut Option<String>,
    image: &mut Option<OpenImage>,
    link_stack: &mut [OpenLink],
) {
    if let Some(h) = heading.as_mut() {
        h.push_str(text);
    }
    if let Some(open) = image.as_mut() {
        open.alt.push_str(text);
    } else if let Some(open) = link_stack.last_mut() {
        open.text.push_str(text);
    }
}

fn image_ref(target: String, alt: Option<String>, line: usize) -> ImageRef {
    let alt = alt.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    ImageRef {
        remote: is_remote(&target),
        target,
        alt,
        line,
    }
}

/// Lower-cased attribute name → value for an HTML tag or shortcode.
///
/// The first occurrence of an attribute wins.
fn attributes(fragment: &str) -> std::collections::HashMap<String, String> {
    let mut attrs = std::collections::HashMap::new();
    for cap in ATTR_RE.captures_iter(fragment) {
        let name = cap[1].to_ascii_lowercase();
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        attrs.entry(name).or_insert(value);
    }
    attrs
}
