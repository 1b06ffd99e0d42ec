//! Validation orchestrator.
//!
//! Runs the lint, link, and image [`Check`]s over documents of a
//! [`ContentTree`] and aggregates the results.
//!
//! # Behaviour
//!
//! - The three checks for one document run concurrently (`tokio::join!`);
//!   documents are validated concurrently with each other
//!   (`futures::future::join_all`). The tree is only read.
//! - Broken references and lint violations are issues, never errors. The
//!   only error is asking for a logical path the tree does not contain.
//! - Category and minimum-severity filters apply after the merge.
//! - Issues are sorted by line and column within a document; documents
//!   appear in reading order.
//! - Remote probes are capped by the [`HttpProbe`] semaphore and never
//!   retried.

pub mod checks;
pub mod issue;
pub mod lint;
pub mod probe;

use std::time::Duration;

use anyhow::{bail, Result};
use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use doctree_core::ContentTree;

pub use checks::{Check, CheckContext, BROKEN_IMAGE, BROKEN_LINK};
pub use issue::{Category, Issue, Severity};
pub use lint::{LintEngine, LintFinding, MarkdownLinter};
pub use probe::{FsProbe, HttpProbe, LocalProbe, RemoteProbe, RemoteStatus};

use crate::config::Config;

/// Filters and switches for one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub categories: Vec<Category>,
    pub min_severity: Severity,
    pub check_remote: bool,
    /// Matched against the raw reference string.
    pub ignore: Vec<Regex>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            categories: vec![Category::Lint, Category::Link, Category::Image],
            min_severity: Severity::Warning,
            check_remote: true,
            ignore: Vec::new(),
        }
    }
}

impl ValidationOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            categories: config.validation.categories.clone(),
            min_severity: config.validation.min_severity,
            check_remote: config.validation.check_remote,
            ignore: config.ignore_regexes()?,
        })
    }

    fn keeps(&self, issue: &Issue) -> bool {
        issue.severity >= self.min_severity && self.categories.contains(&issue.category)
    }
}

/// Aggregate result over a set of documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub documents_checked: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

pub struct Validator<'t> {
    tree: &'t ContentTree,
    lint: Box<dyn LintEngine>,
    local: Box<dyn LocalProbe>,
    remote: Option<Box<dyn RemoteProbe>>,
    options: ValidationOptions,
}

impl<'t> Validator<'t> {
    pub fn new(
        tree: &'t ContentTree,
        lint: Box<dyn LintEngine>,
        local: Box<dyn LocalProbe>,
        options: ValidationOptions,
    ) -> Self {
        Self {
            tree,
            lint,
            local,
            remote: None,
            options,
        }
    }

    /// Attach a remote probe. Ignored when `check_remote` is off.
    pub fn with_remote(mut self, remote: Box<dyn RemoteProbe>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Validator wired to the configured linter, the content root on disk,
    /// and (if enabled) an HTTP probe.
    pub fn from_config(
        tree: &'t ContentTree,
        config: &Config,
        options: ValidationOptions,
    ) -> Result<Self> {
        let mut validator = Self::new(
            tree,
            Box::new(MarkdownLinter::from_config(&config.lint)),
            Box::new(FsProbe::new(&config.content.root)),
            options,
        );
        if validator.options.check_remote {
            let probe = HttpProbe::new(
                Duration::from_millis(config.validation.remote_timeout_ms),
                config.validation.max_concurrent_probes,
            )?;
            validator = validator.with_remote(Box::new(probe));
        }
        Ok(validator)
    }

    fn context(&self) -> CheckContext<'_> {
        CheckContext {
            tree: self.tree,
            lint: self.lint.as_ref(),
            local: self.local.as_ref(),
            remote: if self.options.check_remote {
                self.remote.as_deref()
            } else {
                None
            },
            ignore: &self.options.ignore,
        }
    }

    /// Validate one document by logical path.
    ///
    /// Fails only when the tree has no document at `logical_path`.
    pub async fn validate_document(&self, logical_path: &str) -> Result<Vec<Issue>> {
        let id = self.tree.require(logical_path)?;
        let node = self.tree.node(id)?;
        if node.is_directory() {
            bail!("'{}' is a directory, not a document", logical_path);
        }

        let ctx = self.context();
        let run = |check: Check| {
            let enabled = self.options.categories.contains(&check.category());
            let ctx = &ctx;
            async move {
                if enabled {
                    check.run(ctx, node).await
                } else {
                    Vec::new()
                }
            }
        };
        let (lint, links, images) =
            tokio::join!(run(Check::Lint), run(Check::Link), run(Check::Image));

        let mut issues: Vec<Issue> = lint
            .into_iter()
            .chain(links)
            .chain(images)
            .filter(|issue| self.options.keeps(issue))
            .collect();
        issues.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
        Ok(issues)
    }

    /// Validate the given logical paths, in the given order.
    ///
    /// Every path is checked for existence before any document is
    /// validated.
    pub async fn validate_paths(&self, paths: &[String]) -> Result<ValidationReport> {
        for path in paths {
            let id = self.tree.require(path)?;
            if self.tree.node(id)?.is_directory() {
                bail!("'{}' is a directory, not a document", path);
            }
        }

        let results = join_all(paths.iter().map(|p| self.validate_document(p))).await;
        let mut report = ValidationReport {
            documents_checked: paths.len(),
            issues: Vec::new(),
        };
        for issues in results {
            report.issues.extend(issues?);
        }

        info!(
            documents = report.documents_checked,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation complete"
        );
        Ok(report)
    }

    /// Validate every document in reading order.
    pub async fn validate_all(&self) -> Result<ValidationReport> {
        let paths: Vec<String> = self
            .tree
            .flatten_ordered(None)?
            .into_iter()
            .filter_map(|id| self.tree.get(id).map(|n| n.logical_path.clone()))
            .collect();
        self.validate_paths(&paths).await
    }
}
