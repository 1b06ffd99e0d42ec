//! # doctree Core
//!
//! Shared, I/O-free logic for doctree: document path parsing, metadata
//! extraction, the weight-ordered content tree, and tree-only link
//! resolution.
//!
//! This crate contains no tokio, filesystem, or network dependencies.
//! Everything that touches the outside world (stores backed by disk,
//! existence probes, HTTP checks) lives in the application crate and
//! talks to this one through plain values and the [`store::DocumentStore`]
//! trait.
//!
//! ## Data Flow
//!
//! ```text
//! (path, text) ──▶ path::parse_path ──▶ metadata::extract ──▶ ContentTree
//!                                                               │
//!                        ┌──────────────────────┬───────────────┤
//!                        ▼                      ▼               ▼
//!                resolve::resolve_link   flatten_ordered   map::render_map
//! ```

pub mod error;
pub mod map;
pub mod metadata;
pub mod models;
pub mod path;
pub mod resolve;
pub mod store;
pub mod translation;
pub mod tree;

pub use error::TreeError;
pub use models::{CodeBlock, Frontmatter, ImageRef, LinkRef};
pub use tree::{ContentTree, Node, NodeId};
