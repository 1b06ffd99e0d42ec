//! Building trees from a store and writing changes through to it.
//!
//! Trees are rebuilt from the store on every invocation; nothing is
//! persisted between runs. Mutations go to both sides: creates and
//! updates hit the store first so a failed write never leaves the tree
//! ahead of the store, and deletes hit the tree first so structural
//! errors (root, non-empty directory) stop before anything is removed.

use tracing::info;

use doctree_core::error::{Result, TreeError};
use doctree_core::store::DocumentStore;
use doctree_core::{ContentTree, NodeId};

/// Build a tree for `language` from every document in the store.
///
/// Untagged paths are read as `default_language` documents.
pub async fn load_tree(
    store: &dyn DocumentStore,
    language: &str,
    default_language: &str,
) -> Result<ContentTree> {
    let docs = store.list().await?;
    let mut tree = ContentTree::new(language, default_language);
    let mut accepted = 0usize;
    for doc in &docs {
        if tree.ingest(&doc.path, &doc.text)?.is_some() {
            accepted += 1;
        }
    }
    info!(
        language,
        listed = docs.len(),
        accepted,
        rejected = docs.len() - accepted,
        "content tree loaded"
    );
    Ok(tree)
}

/// Build a language-agnostic tree (style guides, exemplar corpora).
///
/// Every document is accepted regardless of its language tag.
pub async fn load_reference_tree(
    store: &dyn DocumentStore,
    language: &str,
    default_language: &str,
) -> Result<ContentTree> {
    let docs = store.list().await?;
    let mut tree = ContentTree::new(language, default_language);
    for doc in &docs {
        tree.force_ingest(&doc.path, &doc.text)?;
    }
    info!(documents = docs.len(), "reference tree loaded");
    Ok(tree)
}

/// Write a new document and ingest it.
///
/// Returns `None` when the tree rejects the document's language; the
/// store write still happened.
pub async fn create_document(
    store: &dyn DocumentStore,
    tree: &mut ContentTree,
    path: &str,
    text: &str,
) -> Result<Option<NodeId>> {
    store.write(path, text).await?;
    tree.ingest(path, text)
}

/// Overwrite the document at `logical_path`, in the store and the tree.
pub async fn update_document(
    store: &dyn DocumentStore,
    tree: &mut ContentTree,
    logical_path: &str,
    text: &str,
) -> Result<NodeId> {
    let id = tree.require(logical_path)?;
    let source = tree
        .node(id)?
        .source_path
        .clone()
        .ok_or_else(|| TreeError::NotFound(logical_path.to_string()))?;
    store.update(&source, text).await?;
    tree.update_content(id, text)?;
    Ok(id)
}

/// Delete the document at `logical_path`.
///
/// `Ok(false)` when the tree has no such node. Directories have no store
/// counterpart and are only removed from the tree.
pub async fn delete_document(
    store: &dyn DocumentStore,
    tree: &mut ContentTree,
    logical_path: &str,
) -> Result<bool> {
    let source = tree
        .get_by_path(logical_path)
        .and_then(|node| node.source_path.clone());
    if !tree.delete(logical_path)? {
        return Ok(false);
    }
    if let Some(source) = source {
        store.delete(&source).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctree_core::store::memory::InMemoryStore;

    fn store() -> InMemoryStore {
        InMemoryStore::with_documents([
            ("docs/index.md", "---\nweight: 5\n---\n# Docs\n"),
            ("docs/guide.md", "---\nweight: 10\n---\n# Guide\n"),
            ("docs/guide.fr.md", "# Guide FR\n"),
            ("about.md", "# About\n"),
        ])
    }

    #[tokio::test]
    async fn test_load_tree_filters_language() {
        let tree = load_tree(&store(), "en", "en").await.unwrap();
        assert_eq!(tree.document_count(), 3);
        assert_eq!(tree.get_by_path("docs").unwrap().weight, 5);
        assert_eq!(
            tree.get_by_path("docs/guide").unwrap().language.as_deref(),
            Some("en")
        );
    }

    #[tokio::test]
    async fn test_load_reference_tree_accepts_everything() {
        let tree = load_reference_tree(&store(), "en", "en").await.unwrap();
        // guide.md and guide.fr.md share a logical path.
        assert_eq!(tree.document_count(), 3);
        assert!(tree.get_by_path("docs/guide").is_some());
    }

    #[tokio::test]
    async fn test_write_through() {
        let store = store();
        let mut tree = load_tree(&store, "en", "en").await.unwrap();

        let id = create_document(&store, &mut tree, "docs/faq.md", "# FAQ\n")
            .await
            .unwrap();
        assert!(id.is_some());
        assert_eq!(store.read("docs/faq.md").as_deref(), Some("# FAQ\n"));

        let rejected = create_document(&store, &mut tree, "docs/faq.de.md", "# FAQ\n")
            .await
            .unwrap();
        assert!(rejected.is_none());

        update_document(&store, &mut tree, "docs/guide", "---\nweight: 1\n---\n# Guide v2\n")
            .await
            .unwrap();
        assert_eq!(tree.get_by_path("docs/guide").unwrap().title(), "Guide v2");
        assert!(store.read("docs/guide.md").unwrap().contains("v2"));

        assert!(delete_document(&store, &mut tree, "docs/faq").await.unwrap());
        assert!(store.read("docs/faq.md").is_none());
        assert!(!delete_document(&store, &mut tree, "docs/faq").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_non_empty_directory_leaves_store_alone() {
        let store = store();
        let mut tree = load_tree(&store, "en", "en").await.unwrap();
        let err = delete_document(&store, &mut tree, "docs").await.unwrap_err();
        assert!(matches!(err, TreeError::NonEmptyDirectory { .. }));
        assert!(store.read("docs/index.md").is_some());
        assert!(tree.get_by_path("docs/guide").is_some());
    }
}
