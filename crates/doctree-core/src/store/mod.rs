//! Document store abstraction.
//!
//! The [`DocumentStore`] trait is the only way the tree's content enters or
//! leaves the process. Paths are opaque strings handed to
//! [`parse_path`](crate::path::parse_path); the tree never assumes they are
//! filesystem paths.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

/// One document as held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub path: String,
    pub text: String,
}

/// Abstract persistence for documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list`](DocumentStore::list) | All documents, sorted by path |
/// | [`write`](DocumentStore::write) | Create a new document |
/// | [`update`](DocumentStore::update) | Overwrite an existing document |
/// | [`delete`](DocumentStore::delete) | Remove an existing document |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document as `(path, text)`, sorted by path.
    async fn list(&self) -> Result<Vec<StoredDocument>>;

    /// Create a document. Fails if `path` already exists.
    async fn write(&self, path: &str, text: &str) -> Result<()>;

    /// Overwrite a document. Fails if `path` does not exist.
    async fn update(&self, path: &str, text: &str) -> Result<()>;

    /// Delete a document. Fails if `path` does not exist.
    async fn delete(&self, path: &str) -> Result<()>;
}
