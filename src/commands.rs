//! CLI command implementations.
//!
//! Each `run_*` function loads what it needs, prints to stdout, and
//! returns. Formatting lives in small `format_*` helpers so output can be
//! tested without capturing stdout.

use anyhow::{bail, Context, Result};
use regex::Regex;

use doctree_core::map::render_map;
use doctree_core::resolve::resolve_link;
use doctree_core::translation::{translation_status, TranslationStatus};
use doctree_core::{ContentTree, Node};

use crate::config::Config;
use crate::fs_store::FilesystemStore;
use crate::ingest::load_tree;
use crate::validate::{Category, Severity, ValidationOptions, ValidationReport, Validator};

/// Load the tree for `language` from the content root.
pub async fn open_tree(config: &Config, language: &str) -> Result<ContentTree> {
    let store = FilesystemStore::new(&config.content)?;
    let tree = load_tree(&store, language, config.content.default_language())
        .await
        .with_context(|| {
            format!(
                "Failed to load content from {}",
                config.content.root.display()
            )
        })?;
    Ok(tree)
}

pub fn run_map(tree: &ContentTree, images: bool) {
    print!("{}", render_map(tree, images));
}

pub fn run_list(tree: &ContentTree, from: Option<&str>) -> Result<()> {
    print!("{}", format_list(tree, from)?);
    Ok(())
}

pub fn format_list(tree: &ContentTree, from: Option<&str>) -> Result<String> {
    let mut out = String::new();
    for id in tree.flatten_ordered(from)? {
        let node = tree.node(id)?;
        out.push_str(&format!("{}\t{}\t{}\n", node.logical_path, node.weight, node.title()));
    }
    Ok(out)
}

pub fn run_show(tree: &ContentTree, path: &str) -> Result<()> {
    let node = tree.node(tree.require(path)?)?;
    print!("{}", format_show(node)?);
    Ok(())
}

pub fn format_show(node: &Node) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("logical path: {}\n", node.logical_path));
    out.push_str(&format!("title:        {}\n", node.title()));
    if node.is_directory() {
        out.push_str("kind:         directory\n");
        out.push_str(&format!("weight:       {}\n", node.weight));
        out.push_str(&format!("children:     {}\n", node.children.len()));
        return Ok(out);
    }

    out.push_str("kind:         document\n");
    out.push_str(&format!(
        "source:       {}\n",
        node.source_path.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "language:     {}\n",
        node.language.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "weight:       {} (declared {})\n",
        node.weight, node.declared_weight
    ));
    out.push_str(&format!("hash:         {}\n", node.hash.as_deref().unwrap_or("-")));
    out.push_str(&format!(
        "frontmatter:  {}\n",
        serde_json::to_string_pretty(&node.frontmatter)?
    ));

    if !node.images.is_empty() {
        out.push_str("images:\n");
        for image in &node.images {
            let remote = if image.remote { " [remote]" } else { "" };
            match &image.alt {
                Some(alt) => out.push_str(&format!(
                    "  {}: {} ({}){}\n",
                    image.line, image.target, alt, remote
                )),
                None => out.push_str(&format!("  {}: {}{}\n", image.line, image.target, remote)),
            }
        }
    }
    if !node.code_blocks.is_empty() {
        out.push_str("code blocks:\n");
        for block in &node.code_blocks {
            out.push_str(&format!(
                "  {}: {} ({} lines)\n",
                block.line,
                block.language.as_deref().unwrap_or("-"),
                block.content.lines().count()
            ));
        }
    }
    if !node.links.is_empty() {
        out.push_str("links:\n");
        for link in &node.links {
            out.push_str(&format!("  {}: {} [{}]\n", link.line, link.target, link.text));
        }
    }
    Ok(out)
}

pub fn run_siblings(tree: &ContentTree, path: &str) -> Result<()> {
    let id = tree.require(path)?;
    for sibling in tree.siblings(id) {
        let node = tree.node(sibling)?;
        println!("{}\t{}", node.logical_path, node.title());
    }
    Ok(())
}

pub fn run_resolve(tree: &ContentTree, reference: &str, from: &str) -> Result<()> {
    match resolve_link(tree, reference, from) {
        Some(id) => {
            println!("{}", tree.node(id)?.logical_path);
            Ok(())
        }
        None => bail!("'{}' does not resolve from '{}'", reference, from),
    }
}

/// Command-line overrides for `validate`.
#[derive(Debug, Clone, Default)]
pub struct ValidateArgs {
    pub paths: Vec<String>,
    pub min_severity: Option<Severity>,
    pub categories: Vec<Category>,
    pub no_remote: bool,
    pub ignore: Vec<String>,
    pub json: bool,
}

impl ValidateArgs {
    pub fn options(&self, config: &Config) -> Result<ValidationOptions> {
        let mut options = ValidationOptions::from_config(config)?;
        if let Some(min) = self.min_severity {
            options.min_severity = min;
        }
        if !self.categories.is_empty() {
            options.categories = self.categories.clone();
        }
        if self.no_remote {
            options.check_remote = false;
        }
        for pattern in &self.ignore {
            let re = Regex::new(pattern)
                .with_context(|| format!("Invalid ignore pattern: '{}'", pattern))?;
            options.ignore.push(re);
        }
        Ok(options)
    }
}

/// Returns `true` when any error-severity issue remains.
pub async fn run_validate(
    tree: &ContentTree,
    config: &Config,
    args: &ValidateArgs,
) -> Result<bool> {
    let validator = Validator::from_config(tree, config, args.options(config)?)?;
    let report = if args.paths.is_empty() {
        validator.validate_all().await?
    } else {
        validator.validate_paths(&args.paths).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(report.has_errors())
}

pub fn format_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    for issue in &report.issues {
        out.push_str(&format!("{}\n", issue));
    }
    out.push_str(&format!(
        "{} document(s) checked: {} error(s), {} warning(s)\n",
        report.documents_checked,
        report.error_count(),
        report.warning_count()
    ));
    out
}

pub async fn run_status(
    config: &Config,
    source: &ContentTree,
    target_language: &str,
) -> Result<()> {
    if target_language == source.language() {
        bail!("target language '{}' is the source language", target_language);
    }
    let target = open_tree(config, target_language).await?;
    print!("{}", format_status(source, &target)?);
    Ok(())
}

pub fn format_status(source: &ContentTree, target: &ContentTree) -> Result<String> {
    let mut out = String::new();
    for id in source.flatten_ordered(None)? {
        let node = source.node(id)?;
        let status = translation_status(node, target.get_by_path(&node.logical_path));
        let label = match status {
            TranslationStatus::Missing => "missing",
            TranslationStatus::Stale => "stale",
            TranslationStatus::Current => "current",
        };
        out.push_str(&format!("{:<8}{}\n", label, node.logical_path));
    }
    Ok(out)
}
