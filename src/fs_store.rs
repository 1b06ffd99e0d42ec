//! Filesystem-backed [`DocumentStore`].
//!
//! Walks `[content].root` and returns every file matching the include
//! globs and none of the exclude globs, with paths relative to the root
//! and `/`-separated. `.git`, `target`, and `node_modules` are always
//! excluded.
//!
//! Listing is synchronous `walkdir` traversal run on the blocking pool;
//! writes go through `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use doctree_core::error::{Result, TreeError};
use doctree_core::store::{DocumentStore, StoredDocument};

use crate::config::ContentConfig;

const DEFAULT_EXCLUDES: [&str; 3] = ["**/.git/**", "**/target/**", "**/node_modules/**"];

#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FilesystemStore {
    pub fn new(config: &ContentConfig) -> anyhow::Result<Self> {
        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(config.exclude_globs.iter().cloned());
        Ok(Self {
            root: config.root.clone(),
            include: build_globset(&config.include_globs)?,
            exclude: build_globset(&excludes)?,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Absolute path for a store path. Rejects paths escaping the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir)
        });
        if path.is_empty() || escapes {
            return Err(TreeError::Store(format!("invalid store path: {}", path)));
        }
        Ok(self.root.join(relative))
    }

    fn scan(&self) -> Result<Vec<StoredDocument>> {
        if !self.root.exists() {
            return Err(TreeError::Store(format!(
                "content root does not exist: {}",
                self.root.display()
            )));
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(self.follow_symlinks) {
            let entry = entry.map_err(store_error)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().replace('\\', "/");

            if self.exclude.is_match(&rel_str) || !self.include.is_match(&rel_str) {
                continue;
            }

            match std::fs::read_to_string(path) {
                Ok(text) => docs.push(StoredDocument { path: rel_str, text }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }

        docs.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), documents = docs.len(), "scanned content root");
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for FilesystemStore {
    async fn list(&self) -> Result<Vec<StoredDocument>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.scan())
            .await
            .map_err(store_error)?
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if tokio::fs::try_exists(&target).await.map_err(store_error)? {
            return Err(TreeError::Store(format!("document already exists: {}", path)));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(store_error)?;
        }
        tokio::fs::write(&target, text).await.map_err(store_error)
    }

    async fn update(&self, path: &str, text: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if !tokio::fs::try_exists(&target).await.map_err(store_error)? {
            return Err(TreeError::Store(format!("no such document: {}", path)));
        }
        tokio::fs::write(&target, text).await.map_err(store_error)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TreeError::Store(format!("no such document: {}", path))
            } else {
                store_error(e)
            }
        })
    }
}

fn store_error(e: impl std::fmt::Display) -> TreeError {
    TreeError::Store(e.to_string())
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
