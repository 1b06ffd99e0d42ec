use thiserror::Error;

/// Hard failures raised by the content tree and document stores.
///
/// Negative outcomes that are part of normal operation are not errors:
/// a rejected ingestion is `Ok(None)` and a failed link resolution is
/// `None`.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("no node at logical path '{0}'")]
    NotFound(String),

    #[error("the root node cannot be deleted")]
    RootDeletion,

    #[error("directory '{path}' still has {children} child node(s)")]
    NonEmptyDirectory { path: String, children: usize },

    #[error("logical path '{path}' is already a {existing}")]
    PathConflict { path: String, existing: &'static str },

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
