//! In-memory [`DocumentStore`] for tests and embedding.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so listing is naturally
//! sorted by path.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, TreeError};

use super::{DocumentStore, StoredDocument};

/// In-memory document store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(path, text)` pairs.
    pub fn with_documents<I, P, T>(docs: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let map = docs
            .into_iter()
            .map(|(p, t)| (p.into(), t.into()))
            .collect();
        Self {
            docs: RwLock::new(map),
        }
    }

    /// Current text at `path`, if any.
    pub fn read(&self, path: &str) -> Option<String> {
        self.docs.read().ok()?.get(path).cloned()
    }
}

fn poisoned() -> TreeError {
    TreeError::Store("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<StoredDocument>> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs
            .iter()
            .map(|(path, text)| StoredDocument {
                path: path.clone(),
                text: text.clone(),
            })
            .collect())
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        if docs.contains_key(path) {
            return Err(TreeError::Store(format!("document already exists: {}", path)));
        }
        docs.insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn update(&self, path: &str, text: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        match docs.get_mut(path) {
            Some(existing) => {
                *existing = text.to_string();
                Ok(())
            }
            None => Err(TreeError::Store(format!("no such document: {}", path))),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        docs.remove(path)
            .map(|_| ())
            .ok_or_else(|| TreeError::Store(format!("no such document: {}", path)))
    }
}
