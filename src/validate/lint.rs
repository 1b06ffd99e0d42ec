//! Content-quality checks.
//!
//! The orchestrator only talks to a [`LintEngine`]; [`MarkdownLinter`] is
//! the bundled implementation. Every rule it ships reports warnings.
//!
//! | Rule | Fires when |
//! |------|-----------|
//! | `trailing-whitespace` | a line ends in spaces or tabs |
//! | `heading-increment` | a heading skips a level (`#` then `###`) |
//! | `multiple-h1` | the body has more than one level-1 heading |
//! | `line-length` | a line exceeds `max_line_length` (off by default) |
//!
//! Lines inside fenced code blocks and the frontmatter block are exempt.

use std::collections::HashSet;

use doctree_core::metadata::split_frontmatter;

use super::issue::Severity;
use crate::config::LintConfig;

pub const TRAILING_WHITESPACE: &str = "trailing-whitespace";
pub const HEADING_INCREMENT: &str = "heading-increment";
pub const MULTIPLE_H1: &str = "multiple-h1";
pub const LINE_LENGTH: &str = "line-length";

/// A single lint result, positioned in the raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub rule: &'static str,
    pub message: String,
}

/// A content-quality engine.
///
/// `path` is only used for messages; engines must not read the filesystem.
pub trait LintEngine: Send + Sync {
    fn lint(&self, path: &str, text: &str) -> Vec<LintFinding>;
}

/// Built-in markdown rules.
#[derive(Debug, Clone, Default)]
pub struct MarkdownLinter {
    disabled: HashSet<String>,
    max_line_length: Option<usize>,
}

impl MarkdownLinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LintConfig) -> Self {
        Self {
            disabled: config.disabled_rules.iter().cloned().collect(),
            max_line_length: config.max_line_length,
        }
    }

    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = Some(max);
        self
    }

    fn enabled(&self, rule: &str) -> bool {
        !self.disabled.contains(rule)
    }
}

impl LintEngine for MarkdownLinter {
    fn lint(&self, _path: &str, text: &str) -> Vec<LintFinding> {
        let (_, body, skipped) = split_frontmatter(text);
        let mut findings = Vec::new();
        let mut fence: Option<Fence> = None;
        let mut previous_level: Option<usize> = None;
        let mut seen_h1 = false;

        for (i, raw) in body.lines().enumerate() {
            let line_no = skipped + i + 1;

            if let Some(open) = fence {
                if open.closed_by(raw) {
                    fence = None;
                }
                continue;
            }
            if let Some(open) = Fence::opened_by(raw) {
                fence = Some(open);
                continue;
            }

            if self.enabled(TRAILING_WHITESPACE) {
                let trimmed = raw.trim_end_matches([' ', '\t']);
                if trimmed.len() < raw.len() {
                    findings.push(warning(
                        line_no,
                        trimmed.chars().count() + 1,
                        TRAILING_WHITESPACE,
                        "trailing whitespace".to_string(),
                    ));
                }
            }

            if let Some(max) = self.max_line_length.filter(|_| self.enabled(LINE_LENGTH)) {
                let len = raw.chars().count();
                if len > max {
                    findings.push(warning(
                        line_no,
                        max + 1,
                        LINE_LENGTH,
                        format!("line is {} characters long (max {})", len, max),
                    ));
                }
            }

            let Some(level) = heading_level(raw) else {
                continue;
            };
            if self.enabled(HEADING_INCREMENT) {
                if let Some(prev) = previous_level {
                    if level > prev + 1 {
                        findings.push(warning(
                            line_no,
                            1,
                            HEADING_INCREMENT,
                            format!("heading jumps from level {} to level {}", prev, level),
                        ));
                    }
                }
            }
            if level == 1 {
                if seen_h1 && self.enabled(MULTIPLE_H1) {
                    findings.push(warning(
                        line_no,
                        1,
                        MULTIPLE_H1,
                        "more than one level-1 heading".to_string(),
                    ));
                }
                seen_h1 = true;
            }
            previous_level = Some(level);
        }

        findings
    }
}

fn warning(line: usize, column: usize, rule: &'static str, message: String) -> LintFinding {
    LintFinding {
        line,
        column,
        severity: Severity::Warning,
        rule,
        message,
    }
}

/// An open fenced code block.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Self> {
        let rest = strip_indent(line)?;
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        (len >= 3).then_some(Self { marker, len })
    }

    fn closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_indent(line) else {
            return false;
        };
        let len = rest.chars().take_while(|c| *c == self.marker).count();
        len >= self.len && rest[len * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Strip up to three leading spaces; `None` for indented code.
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    (indent <= 3).then(|| &line[indent..])
}

/// Level of an ATX heading line.
fn heading_level(line: &str) -> Option<usize> {
    let rest = strip_indent(line)?;
    let level = rest.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    match rest[level..].chars().next() {
        None | Some(' ') | Some('\t') => Some(level),
        _ => None,
    }
}
