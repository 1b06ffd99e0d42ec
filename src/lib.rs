//! # doctree
//!
//! A language-aware content tree for markdown documentation.
//!
//! doctree loads a directory of markdown documents (optionally in several
//! language variants like `guide.fr.md`), builds a weight-ordered tree for
//! one language, resolves links between documents without assuming the
//! tree mirrors the filesystem, and validates documents for broken links,
//! broken images, and basic markdown style issues.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ DocumentStore│──▶│ ContentTree  │──▶│ map / list / show│
//! │ FS / memory  │   │ (core crate) │   └──────────────────┘
//! └──────────────┘   └──────┬───────┘
//!                           │ resolve_link
//!                           ▼
//!                    ┌──────────────┐   ┌──────────────────┐
//!                    │  Validator   │──▶│ FsProbe/HttpProbe│
//!                    │ lint+link+img│   └──────────────────┘
//!                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! doctree map --images                 # reading-order content map
//! doctree resolve ./setup.md --from docs/guide
//! doctree validate --min-severity error
//! doctree status --target fr           # translation staleness
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`fs_store`] | Filesystem document store |
//! | [`ingest`] | Tree loading and write-through mutations |
//! | [`validate`] | Lint, link, and image validation |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod fs_store;
pub mod ingest;
pub mod logging;
pub mod validate;
