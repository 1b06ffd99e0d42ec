//! The three per-document checks.
//!
//! Link and image checks share one path: resolve against the tree, then
//! fall back to the local probe (relative to the document's store path)
//! or, for remote targets, the remote probe. References matching an
//! ignore pattern, fragment-only references, and special schemes
//! (`mailto:` and friends) never produce issues.

use futures::future::join_all;
use regex::Regex;

use doctree_core::resolve::{classify_reference, physical_candidate, resolve_link, Reference};
use doctree_core::{ContentTree, Node};

use super::issue::{Category, Issue, Severity};
use super::lint::LintEngine;
use super::probe::{LocalProbe, RemoteProbe, RemoteStatus};

pub const BROKEN_LINK: &str = "broken-link";
pub const BROKEN_IMAGE: &str = "broken-image";

/// Read-only state shared by every check of a validation run.
pub struct CheckContext<'a> {
    pub tree: &'a ContentTree,
    pub lint: &'a dyn LintEngine,
    pub local: &'a dyn LocalProbe,
    /// `None` disables remote checking.
    pub remote: Option<&'a dyn RemoteProbe>,
    pub ignore: &'a [Regex],
}

impl CheckContext<'_> {
    fn ignored(&self, raw: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Lint,
    Link,
    Image,
}

impl Check {
    pub fn category(self) -> Category {
        match self {
            Check::Lint => Category::Lint,
            Check::Link => Category::Link,
            Check::Image => Category::Image,
        }
    }

    /// Issues this check finds in `node`. Never fails.
    pub async fn run(self, ctx: &CheckContext<'_>, node: &Node) -> Vec<Issue> {
        match self {
            Check::Lint => lint_issues(ctx, node),
            Check::Link => {
                let targets = node.links.iter().map(|l| (l.target.as_str(), l.line));
                reference_issues(ctx, node, targets, Kind::Link).await
            }
            Check::Image => {
                let targets = node.images.iter().map(|i| (i.target.as_str(), i.line));
                reference_issues(ctx, node, targets, Kind::Image).await
            }
        }
    }
}

fn lint_issues(ctx: &CheckContext<'_>, node: &Node) -> Vec<Issue> {
    let Some(text) = node.content.as_deref() else {
        return Vec::new();
    };
    ctx.lint
        .lint(&node.logical_path, text)
        .into_iter()
        .map(|finding| Issue {
            file: node.logical_path.clone(),
            line: finding.line,
            column: finding.column,
            severity: finding.severity,
            category: Category::Lint,
            rule: finding.rule.to_string(),
            message: finding.message,
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Link,
    Image,
}

impl Kind {
    fn category(self) -> Category {
        match self {
            Kind::Link => Category::Link,
            Kind::Image => Category::Image,
        }
    }

    fn rule(self) -> &'static str {
        match self {
            Kind::Link => BROKEN_LINK,
            Kind::Image => BROKEN_IMAGE,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Kind::Link => "link",
            Kind::Image => "image",
        }
    }
}

async fn reference_issues<'n>(
    ctx: &CheckContext<'_>,
    node: &'n Node,
    targets: impl Iterator<Item = (&'n str, usize)>,
    kind: Kind,
) -> Vec<Issue> {
    let probes = targets
        .filter(|(raw, _)| !ctx.ignored(raw))
        .map(|(raw, line)| async move {
            check_reference(ctx, node, raw, kind)
                .await
                .map(|message| Issue {
                    file: node.logical_path.clone(),
                    line,
                    column: 1,
                    severity: Severity::Error,
                    category: kind.category(),
                    rule: kind.rule().to_string(),
                    message,
                })
        });
    join_all(probes).await.into_iter().flatten().collect()
}

/// `Some(message)` when `raw` is broken.
async fn check_reference(
    ctx: &CheckContext<'_>,
    node: &Node,
    raw: &str,
    kind: Kind,
) -> Option<String> {
    match classify_reference(raw) {
        Reference::Fragment | Reference::Special => None,
        Reference::Local(path) => {
            if resolve_link(ctx.tree, raw, &node.logical_path).is_some() {
                return None;
            }
            let source = node.source_path.as_deref().unwrap_or(&node.logical_path);
            let physical = physical_candidate(source, path);
            if ctx.local.exists(&physical) {
                None
            } else {
                Some(format!("{} target '{}' not found", kind.noun(), raw))
            }
        }
        Reference::Remote(url) => {
            let remote = ctx.remote?;
            match remote.probe(url).await {
                RemoteStatus::Reachable => None,
                RemoteStatus::Status(code) => {
                    Some(format!("{} target '{}' returned HTTP {}", kind.noun(), url, code))
                }
                RemoteStatus::TimedOut => Some(format!(
                    "{} target '{}' timed out after {}ms",
                    kind.noun(),
                    url,
                    remote.timeout().as_millis()
                )),
                RemoteStatus::Unreachable(reason) => Some(format!(
                    "{} target '{}' unreachable: {}",
                    kind.noun(),
                    url,
                    reason
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::lint::MarkdownLinter;

    struct NoFiles;

    impl LocalProbe for NoFiles {
        fn exists(&self, _path: &str) -> bool {
            false
        }
    }

    struct Files(Vec<&'static str>);

    impl LocalProbe for Files {
        fn exists(&self, path: &str) -> bool {
            self.0.contains(&path)
        }
    }

    fn tree() -> ContentTree {
        let mut tree = ContentTree::new("en", "en");
        tree.ingest("docs/tutorial.md", "# Tutorial\n").unwrap();
        tree.ingest(
            "docs/guide.md",
            "# Guide\n\n[ok](./tutorial.md)\n[top](#top)\n[mail](mailto:a@b.c)\n\
             [gone](./missing.md)\n\n![logo](img/logo.png)\n![nope](img/none.png)\n",
        )
        .unwrap();
        tree
    }

    #[tokio::test]
    async fn test_link_check_reports_only_broken_local_links() {
        let tree = tree();
        let lint = MarkdownLinter::new();
        let ctx = CheckContext {
            tree: &tree,
            lint: &lint,
            local: &NoFiles,
            remote: None,
            ignore: &[],
        };
        let node = tree.get_by_path("docs/guide").unwrap();
        let issues = Check::Link.run(&ctx, node).await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, BROKEN_LINK);
        assert_eq!(issues[0].line, 6);
        assert_eq!(issues[0].category, Category::Link);
        assert!(issues[0].message.contains("./missing.md"));
    }

    #[tokio::test]
    async fn test_image_check_falls_back_to_local_probe() {
        let tree = tree();
        let lint = MarkdownLinter::new();
        let files = Files(vec!["docs/img/logo.png"]);
        let ctx = CheckContext {
            tree: &tree,
            lint: &lint,
            local: &files,
            remote: None,
            ignore: &[],
        };
        let node = tree.get_by_path("docs/guide").unwrap();
        let issues = Check::Image.run(&ctx, node).await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, BROKEN_IMAGE);
        assert!(issues[0].message.contains("img/none.png"));
    }

    #[tokio::test]
    async fn test_ignore_patterns_match_raw_reference() {
        let tree = tree();
        let lint = MarkdownLinter::new();
        let ignore = vec![Regex::new(r"missing\.md$").unwrap()];
        let ctx = CheckContext {
            tree: &tree,
            lint: &lint,
            local: &NoFiles,
            remote: None,
            ignore: &ignore,
        };
        let node = tree.get_by_path("docs/guide").unwrap();
        assert!(Check::Link.run(&ctx, node).await.is_empty());
    }
}
