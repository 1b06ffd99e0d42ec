//! The weight-ordered content tree.
//!
//! A [`ContentTree`] is an arena of [`Node`]s plus a lookup table keyed by
//! logical path. The arena is the sole owner of every node; `children` and
//! `parent` are plain [`NodeId`] indices, so there are no reference cycles
//! and deleting a node never touches its parent beyond removing one entry
//! from the parent's child list.
//!
//! # Invariants
//!
//! - One node per logical path. The root has the empty logical path and
//!   can never be deleted.
//! - A node is a directory if and only if it has no document text.
//!   Directories are synthesized when a document needs intermediate
//!   path segments that do not exist yet.
//! - Every child list is sorted by weight (stable, so ties keep insertion
//!   order) after each insertion or weight change. Consumers never re-sort.
//! - A tree is scoped to one language. [`ContentTree::ingest`] rejects
//!   documents of any other language instead of storing them. Files
//!   without a language tag are in the tree's default language, which is
//!   not necessarily the tree's own.
//! - Index documents (`index`, `_index`) always have weight
//!   [`INDEX_WEIGHT`]. A directory's weight is the lowest declared weight
//!   of its index documents, capped at [`DEFAULT_WEIGHT`], and is
//!   recomputed whenever an index document is added, updated, or removed.
//!
//! Mutation is single-writer. Once built, a tree can be shared by
//! reference across concurrent readers.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::metadata::{extract, DEFAULT_WEIGHT, INDEX_WEIGHT};
use crate::models::{CodeBlock, Frontmatter, ImageRef, LinkRef};
use crate::path::{join, parent_of, parse_path, ParsedPath, INDEX_NAMES};

/// Index of a node in its tree's arena.
///
/// Ids are never reused within one tree, so a stale id of a deleted node
/// simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A directory or a single-language document.
#[derive(Debug, Clone)]
pub struct Node {
    /// Base name without language suffix or extension.
    pub name: String,
    /// Slash-separated lookup key, stable across language variants.
    pub logical_path: String,
    /// Effective ordering weight; lower sorts first.
    pub weight: i64,
    /// Weight declared in frontmatter (equals `weight` except for index
    /// documents and directories).
    pub declared_weight: i64,
    pub is_index: bool,
    pub children: Vec<NodeId>,
    /// Back-reference only.
    pub parent: Option<NodeId>,
    /// Raw document text; `None` for directories.
    pub content: Option<String>,
    pub frontmatter: Frontmatter,
    pub language: Option<String>,
    /// Path used by the backing store for read/write/delete.
    pub source_path: Option<String>,
    pub hash: Option<String>,
    pub images: Vec<ImageRef>,
    pub code_blocks: Vec<CodeBlock>,
    pub links: Vec<LinkRef>,
}

impl Node {
    fn directory(name: &str, logical_path: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            logical_path: logical_path.to_string(),
            weight: DEFAULT_WEIGHT,
            declared_weight: DEFAULT_WEIGHT,
            is_index: false,
            children: Vec::new(),
            parent,
            content: None,
            frontmatter: Frontmatter::new(),
            language: None,
            source_path: None,
            hash: None,
            images: Vec::new(),
            code_blocks: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.content.is_none()
    }

    /// Frontmatter title, falling back to the base name.
    pub fn title(&self) -> &str {
        self.frontmatter
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.name)
    }
}

/// Incremental, language-scoped index of documents.
#[derive(Debug, Clone)]
pub struct ContentTree {
    language: String,
    default_language: String,
    nodes: Vec<Option<Node>>,
    lookup: HashMap<String, NodeId>,
}

impl ContentTree {
    const ROOT: NodeId = NodeId(0);

    /// Create an empty tree accepting documents in `language`.
    ///
    /// Paths without a language tag (`guide.md`) are read as being in
    /// `default_language`.
    pub fn new(language: impl Into<String>, default_language: impl Into<String>) -> Self {
        let mut lookup = HashMap::new();
        lookup.insert(String::new(), Self::ROOT);
        Self {
            language: language.into(),
            default_language: default_language.into(),
            nodes: vec![Some(Node::directory("", "", None))],
            lookup,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Language assumed for untagged paths.
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.lookup.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of document (non-directory) nodes.
    pub fn document_count(&self) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| !n.is_directory())
            .count()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Like [`get`](Self::get) for callers that assume the node exists.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| TreeError::NotFound(format!("node #{}", id.0)))
    }

    /// O(1) lookup by logical path. Leading and trailing slashes are ignored.
    pub fn lookup(&self, logical_path: &str) -> Option<NodeId> {
        self.lookup.get(logical_path.trim_matches('/')).copied()
    }

    pub fn get_by_path(&self, logical_path: &str) -> Option<&Node> {
        self.lookup(logical_path).and_then(|id| self.get(id))
    }

    /// Lookup for callers that assume the path exists.
    pub fn require(&self, logical_path: &str) -> Result<NodeId> {
        self.lookup(logical_path)
            .ok_or_else(|| TreeError::NotFound(logical_path.to_string()))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The index document of directory `dir`, if it has one.
    pub fn index_of(&self, dir: NodeId) -> Option<NodeId> {
        let node = self.get(dir)?;
        if !node.is_directory() {
            return None;
        }
        INDEX_NAMES
            .iter()
            .filter_map(|name| self.lookup(&join(&node.logical_path, name)))
            .find(|id| self.get(*id).is_some_and(|n| !n.is_directory()))
    }

    /// Ingest a document, rejecting it when its language is not the tree's.
    ///
    /// Returns `Ok(None)` for a rejected document. Ingesting a second
    /// document at an existing logical path updates that node in place.
    pub fn ingest(&mut self, path: &str, text: &str) -> Result<Option<NodeId>> {
        let parsed = parse_path(path, &self.default_language);
        if parsed.language != self.language {
            debug!(
                path,
                language = %parsed.language,
                tree_language = %self.language,
                "rejected document in another language"
            );
            return Ok(None);
        }
        self.insert_document(parsed, path, text).map(Some)
    }

    /// Ingest a document regardless of its language.
    ///
    /// Used for language-agnostic reference corpora such as style guides.
    pub fn force_ingest(&mut self, path: &str, text: &str) -> Result<NodeId> {
        let parsed = parse_path(path, &self.default_language);
        self.insert_document(parsed, path, text)
    }

    fn insert_document(
        &mut self,
        parsed: ParsedPath,
        source_path: &str,
        text: &str,
    ) -> Result<NodeId> {
        let logical_path = parsed.logical_path();
        if logical_path.is_empty() {
            return Err(TreeError::PathConflict {
                path: source_path.to_string(),
                existing: "directory",
            });
        }

        if let Some(id) = self.lookup(&logical_path) {
            let node = self.node(id)?;
            if node.is_directory() {
                return Err(TreeError::PathConflict {
                    path: logical_path,
                    existing: "directory",
                });
            }
            debug!(
                path = source_path,
                logical_path = %logical_path,
                "re-ingesting existing document"
            );
            if let Some(node) = self.slot_mut(id) {
                node.source_path = Some(source_path.to_string());
                node.language = Some(parsed.language);
            }
            self.update_content(id, text)?;
            return Ok(id);
        }

        let parent = self.ensure_directory(&parsed.parent)?;
        let meta = extract(text);
        let weight = if parsed.is_index {
            INDEX_WEIGHT
        } else {
            meta.weight
        };

        let node = Node {
            name: parsed.name,
            logical_path: logical_path.clone(),
            weight,
            declared_weight: meta.weight,
            is_index: parsed.is_index,
            children: Vec::new(),
            parent: Some(parent),
            content: Some(text.to_string()),
            frontmatter: meta.frontmatter,
            language: Some(parsed.language),
            source_path: Some(source_path.to_string()),
            hash: Some(meta.hash),
            images: meta.images,
            code_blocks: meta.code_blocks,
            links: meta.links,
        };
        let id = self.attach(parent, node);

        if parsed.is_index {
            self.refresh_directory_weight(parent);
        }
        Ok(id)
    }

    /// Return the directory node at `path`, creating it and any missing
    /// ancestors.
    fn ensure_directory(&mut self, path: &str) -> Result<NodeId> {
        if path.is_empty() {
            return Ok(Self::ROOT);
        }
        if let Some(id) = self.lookup(path) {
            return match self.get(id) {
                Some(node) if node.is_directory() => Ok(id),
                _ => Err(TreeError::PathConflict {
                    path: path.to_string(),
                    existing: "document",
                }),
            };
        }

        let parent = self.ensure_directory(parent_of(path))?;
        let name = path.rsplit('/').next().unwrap_or(path);
        debug!(path, "synthesized directory node");
        Ok(self.attach(parent, Node::directory(name, path, Some(parent))))
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.lookup.insert(node.logical_path.clone(), id);
        self.nodes.push(Some(node));
        if let Some(p) = self.slot_mut(parent) {
            p.children.push(id);
        }
        self.sort_children(parent);
        id
    }

    /// Recompute `dir`'s weight from its current index documents and
    /// re-sort the grandparent if it changed.
    fn refresh_directory_weight(&mut self, dir: NodeId) {
        let declared = self
            .children(dir)
            .iter()
            .filter_map(|c| self.get(*c))
            .filter(|n| n.is_index && !n.is_directory())
            .map(|n| n.declared_weight)
            .min()
            .unwrap_or(DEFAULT_WEIGHT)
            .min(DEFAULT_WEIGHT);

        let grandparent = match self.slot_mut(dir) {
            Some(node) if node.weight != declared => {
                node.weight = declared;
                node.parent
            }
            _ => return,
        };
        if let Some(gp) = grandparent {
            self.sort_children(gp);
        }
    }

    fn sort_children(&mut self, id: NodeId) {
        let mut children = match self.get(id) {
            Some(node) => node.children.clone(),
            None => return,
        };
        children.sort_by_key(|c| self.get(*c).map(|n| n.weight).unwrap_or(DEFAULT_WEIGHT));
        if let Some(node) = self.slot_mut(id) {
            node.children = children;
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Document children of `id`'s parent (including `id` itself when it
    /// is a document). Empty for the root.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        let parent = match self.get(id).and_then(|n| n.parent) {
            Some(p) => p,
            None => return Vec::new(),
        };
        self.children(parent)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|n| !n.is_directory()))
            .collect()
    }

    /// Documents in reading order: depth-first from the root (or `start`),
    /// visiting children in their weight order.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] when `start` names no node.
    pub fn flatten_ordered(&self, start: Option<&str>) -> Result<Vec<NodeId>> {
        let start = match start {
            Some(path) => self.require(path)?,
            None => Self::ROOT,
        };

        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if !node.is_directory() {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Replace a document's text and everything derived from it.
    ///
    /// Re-sorts the parent's children when the effective weight changed.
    pub fn update_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        let meta = extract(text);
        let node = self
            .slot_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node #{}", id.0)))?;
        if node.is_directory() {
            return Err(TreeError::PathConflict {
                path: node.logical_path.clone(),
                existing: "directory",
            });
        }

        let declared = meta.weight;
        let weight = if node.is_index { INDEX_WEIGHT } else { declared };
        let weight_changed = weight != node.weight;

        node.weight = weight;
        node.declared_weight = declared;
        node.content = Some(text.to_string());
        node.frontmatter = meta.frontmatter;
        node.hash = Some(meta.hash);
        node.images = meta.images;
        node.code_blocks = meta.code_blocks;
        node.links = meta.links;

        let parent = node.parent;
        let is_index = node.is_index;
        if let Some(parent) = parent {
            if weight_changed {
                self.sort_children(parent);
            }
            if is_index {
                self.refresh_directory_weight(parent);
            }
        }
        Ok(())
    }

    /// Remove a document or an empty directory.
    ///
    /// Returns `Ok(false)` when nothing exists at `logical_path`.
    ///
    /// # Errors
    ///
    /// [`TreeError::RootDeletion`] for the root and
    /// [`TreeError::NonEmptyDirectory`] for a directory with children.
    /// The tree is unchanged in both cases.
    pub fn delete(&mut self, logical_path: &str) -> Result<bool> {
        let key = logical_path.trim_matches('/');
        if key.is_empty() {
            return Err(TreeError::RootDeletion);
        }
        let Some(id) = self.lookup(key) else {
            return Ok(false);
        };
        let (parent, is_index) = match self.get(id) {
            Some(node) if !node.children.is_empty() => {
                return Err(TreeError::NonEmptyDirectory {
                    path: key.to_string(),
                    children: node.children.len(),
                })
            }
            Some(node) => (node.parent, node.is_index && !node.is_directory()),
            None => return Ok(false),
        };

        if let Some(p) = parent.and_then(|p| self.slot_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        self.lookup.remove(key);
        self.nodes[id.0] = None;
        if let (Some(p), true) = (parent, is_index) {
            self.refresh_directory_weight(p);
        }
        debug!(logical_path = key, "deleted node");
        Ok(true)
    }
}
