//! Issue types produced by validation.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue severity. `Warning < Error`, so `>=` against a minimum works.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lint,
    Link,
    Image,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lint => write!(f, "lint"),
            Category::Link => write!(f, "link"),
            Category::Image => write!(f, "image"),
        }
    }
}

/// One finding against one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Logical path of the document.
    pub file: String,
    /// 1-based line in the raw document.
    pub line: usize,
    /// 1-based column; 1 when the check has no finer position.
    pub column: usize,
    pub severity: Severity,
    pub category: Category,
    pub rule: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}/{}] {}",
            self.file, self.line, self.column, self.severity, self.category, self.rule, self.message
        )
    }
}
