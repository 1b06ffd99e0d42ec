//! TOML configuration.
//!
//! ```toml
//! [content]
//! root = "./content"
//! language = "fr"
//! default_language = "en"
//!
//! [validation]
//! check_remote = true
//! remote_timeout_ms = 5000
//! ignore_patterns = ["^https://localhost"]
//!
//! [lint]
//! disabled_rules = ["line-length"]
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section except `[content].root` has defaults. [`load_config`]
//! validates the values that would otherwise fail late (regexes, globs,
//! zero timeouts).

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::validate::{Category, Severity};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    pub root: PathBuf,
    #[serde(default = "default_language")]
    pub language: String,
    /// Language of files without a tag (`guide.md`). Defaults to
    /// `language`.
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_language() -> String {
    "en".to_string()
}

impl ContentConfig {
    /// Language assumed for untagged paths.
    pub fn default_language(&self) -> &str {
        self.default_language.as_deref().unwrap_or(&self.language)
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.markdown".to_string(),
        "**/*.mdx".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_check_remote")]
    pub check_remote: bool,
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_remote: default_check_remote(),
            remote_timeout_ms: default_remote_timeout_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
            ignore_patterns: Vec::new(),
            min_severity: default_min_severity(),
            categories: default_categories(),
        }
    }
}

fn default_check_remote() -> bool {
    true
}
fn default_remote_timeout_ms() -> u64 {
    5000
}
fn default_max_concurrent_probes() -> usize {
    8
}
fn default_min_severity() -> Severity {
    Severity::Warning
}
fn default_categories() -> Vec<Category> {
    vec![Category::Lint, Category::Link, Category::Image]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LintConfig {
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub max_line_length: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Defaults for everything, reading content from `root`.
    pub fn minimal(root: impl Into<PathBuf>) -> Self {
        Self {
            content: ContentConfig {
                root: root.into(),
                language: default_language(),
                default_language: None,
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            validation: ValidationConfig::default(),
            lint: LintConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Compiled `[validation].ignore_patterns`.
    pub fn ignore_regexes(&self) -> Result<Vec<Regex>> {
        self.validation
            .ignore_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid ignore pattern: '{}'", p)))
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // A relative content root is relative to the config file.
    if config.content.root.is_relative() {
        if let Some(dir) = path.parent() {
            config.content.root = dir.join(&config.content.root);
        }
    }

    validate_config(&config)?;
    Ok(config)
}

/// Reject values that would only fail once a command is running.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.content.language.trim().is_empty() {
        bail!("content.language must not be empty");
    }
    if config.content.default_language().trim().is_empty() {
        bail!("content.default_language must not be empty");
    }
    if config.content.include_globs.is_empty() {
        bail!("content.include_globs must list at least one pattern");
    }
    for pattern in config
        .content
        .include_globs
        .iter()
        .chain(config.content.exclude_globs.iter())
    {
        globset::Glob::new(pattern).with_context(|| format!("Invalid glob: '{}'", pattern))?;
    }

    if config.validation.remote_timeout_ms == 0 {
        bail!("validation.remote_timeout_ms must be > 0");
    }
    if config.validation.max_concurrent_probes == 0 {
        bail!("validation.max_concurrent_probes must be > 0");
    }
    config.ignore_regexes()?;

    match config.logging.format.as_str() {
        "text" | "json" => {}
        other => bail!(
            "Unknown logging format: '{}'. Must be text or json.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(body: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doctree.toml");
        fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let (tmp, path) = write_config("[content]\nroot = \"content\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.content.root, tmp.path().join("content"));
        assert_eq!(config.content.language, "en");
        assert_eq!(config.content.default_language(), "en");
        assert!(config.validation.check_remote);
        assert_eq!(config.validation.remote_timeout_ms, 5000);
        assert_eq!(config.validation.min_severity, Severity::Warning);
        assert_eq!(config.validation.categories.len(), 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let (_tmp, path) = write_config(
            r#"
[content]
root = "/srv/docs"
language = "fr"
default_language = "en"
exclude_globs = ["drafts/**"]

[validation]
check_remote = false
min_severity = "error"
categories = ["link"]
ignore_patterns = ["^https://internal\\."]

[lint]
disabled_rules = ["trailing-whitespace"]
max_line_length = 120

[logging]
format = "json"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.content.root, PathBuf::from("/srv/docs"));
        assert_eq!(config.content.language, "fr");
        assert_eq!(config.content.default_language(), "en");
        assert!(!config.validation.check_remote);
        assert_eq!(config.validation.min_severity, Severity::Error);
        assert_eq!(config.validation.categories, vec![Category::Link]);
        assert_eq!(config.ignore_regexes().unwrap().len(), 1);
        assert_eq!(config.lint.max_line_length, Some(120));
    }

    #[test]
    fn test_rejects_bad_values() {
        let (_tmp, path) =
            write_config("[content]\nroot = \".\"\n[validation]\nremote_timeout_ms = 0\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) =
            write_config("[content]\nroot = \".\"\n[validation]\nignore_patterns = [\"(\"]\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) = write_config("[content]\nroot = \".\"\n[logging]\nformat = \"xml\"\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) = write_config("[content]\nroot = \".\"\nlanguage = \" \"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
