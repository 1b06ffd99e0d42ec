//! Library-level validation tests against in-memory stores and scripted
//! probes. No filesystem or network access.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use doctree::ingest::load_tree;
use doctree::validate::{
    Category, LocalProbe, MarkdownLinter, RemoteProbe, RemoteStatus, Severity, ValidationOptions,
    Validator, BROKEN_IMAGE, BROKEN_LINK,
};
use doctree_core::store::memory::InMemoryStore;
use doctree_core::ContentTree;

struct NoFiles;

impl LocalProbe for NoFiles {
    fn exists(&self, _path: &str) -> bool {
        false
    }
}

struct ScriptedRemote(HashMap<&'static str, RemoteStatus>);

#[async_trait]
impl RemoteProbe for ScriptedRemote {
    async fn probe(&self, url: &str) -> RemoteStatus {
        self.0.get(url).cloned().unwrap_or(RemoteStatus::Reachable)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(250)
    }
}

async fn tree_of(docs: &[(&str, &str)]) -> ContentTree {
    let store = InMemoryStore::with_documents(docs.iter().copied());
    load_tree(&store, "en", "en").await.unwrap()
}

fn validator(tree: &ContentTree, options: ValidationOptions) -> Validator<'_> {
    Validator::new(tree, Box::new(MarkdownLinter::new()), Box::new(NoFiles), options)
}

const GUIDE: &str = "# Guide\n\nSee [setup](./setup.md) and [gone](./missing.md).  \n";

#[tokio::test]
async fn test_broken_link_and_lint_violation() {
    let tree = tree_of(&[("docs/guide.md", GUIDE), ("docs/setup.md", "# Setup\n")]).await;
    let v = validator(&tree, ValidationOptions::default());

    let issues = v.validate_document("docs/guide").await.unwrap();
    let link_errors: Vec<_> = issues
        .iter()
        .filter(|i| i.category == Category::Link && i.severity == Severity::Error)
        .collect();
    assert_eq!(link_errors.len(), 1);
    assert_eq!(link_errors[0].rule, BROKEN_LINK);
    assert_eq!(link_errors[0].line, 3);
    assert!(issues
        .iter()
        .any(|i| i.category == Category::Lint && i.severity == Severity::Warning));

    let errors_only = ValidationOptions {
        min_severity: Severity::Error,
        ..ValidationOptions::default()
    };
    let v = validator(&tree, errors_only);
    let issues = v.validate_document("docs/guide").await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].category, Category::Link);
}

#[tokio::test]
async fn test_category_filter() {
    let tree = tree_of(&[("docs/guide.md", GUIDE), ("docs/setup.md", "# Setup\n")]).await;
    let options = ValidationOptions {
        categories: vec![Category::Lint],
        ..ValidationOptions::default()
    };
    let issues = validator(&tree, options).validate_document("docs/guide").await.unwrap();
    assert!(!issues.is_empty());
    assert!(issues.iter().all(|i| i.category == Category::Lint));
}

#[tokio::test]
async fn test_missing_path_is_a_hard_error() {
    let tree = tree_of(&[("a.md", "# A\n")]).await;
    let v = validator(&tree, ValidationOptions::default());
    assert!(v.validate_document("nope").await.is_err());
    assert!(v
        .validate_paths(&["a".to_string(), "nope".to_string()])
        .await
        .is_err());
}

#[tokio::test]
async fn test_remote_timeout_and_unreachable_messages() {
    let text = "# Remote\n\n[slow](https://slow.example/)\n\n[down](https://down.example/)\n\n\
                [missing](https://gone.example/)\n\n[fine](https://ok.example/)\n\n\
                ![pic](https://slow.example/pic.png)\n";
    let tree = tree_of(&[("remote.md", text)]).await;
    let remote = ScriptedRemote(HashMap::from([
        ("https://slow.example/", RemoteStatus::TimedOut),
        ("https://slow.example/pic.png", RemoteStatus::TimedOut),
        (
            "https://down.example/",
            RemoteStatus::Unreachable("dns error".to_string()),
        ),
        ("https://gone.example/", RemoteStatus::Status(404)),
    ]));
    let v = validator(&tree, ValidationOptions::default()).with_remote(Box::new(remote));

    let issues = v.validate_document("remote").await.unwrap();
    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    assert_eq!(issues.len(), 4, "{:?}", messages);

    assert_eq!(issues[0].rule, BROKEN_LINK);
    assert!(issues[0].message.contains("timed out after 250ms"));
    assert!(issues[1].message.contains("unreachable"));
    assert!(!issues[1].message.contains("timed out"));
    assert!(issues[2].message.contains("returned HTTP 404"));
    assert_eq!(issues[3].rule, BROKEN_IMAGE);
    assert_eq!(issues[3].category, Category::Image);
    assert!(issues[3].message.contains("timed out"));
}

#[tokio::test]
async fn test_remote_checks_can_be_disabled() {
    let tree = tree_of(&[("remote.md", "# Remote\n\n[down](https://down.example/)\n")]).await;
    let remote = ScriptedRemote(HashMap::from([(
        "https://down.example/",
        RemoteStatus::Unreachable("refused".to_string()),
    )]));
    let options = ValidationOptions {
        check_remote: false,
        ..ValidationOptions::default()
    };
    let v = validator(&tree, options).with_remote(Box::new(remote));
    assert!(v.validate_document("remote").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_skipped_references() {
    let text =
        "# Skips\n\n[top](#top)\n[mail](mailto:team@example.com)\n[draft](./drafts/wip.md#intro)\n";
    let tree = tree_of(&[("skips.md", text)]).await;
    let options = ValidationOptions {
        ignore: vec![Regex::new(r"^\./drafts/.*#intro$").unwrap()],
        ..ValidationOptions::default()
    };
    let issues = validator(&tree, options).validate_document("skips").await.unwrap();
    assert!(issues.is_empty(), "{:?}", issues);
}

#[tokio::test]
async fn test_links_resolve_through_tree_not_filesystem() {
    let text = "# Guide\n\n[a](./tutorial)\n[b](./tutorial.md)\n[c](./tutorial.en.md)\n\
                [d](/docs/)\n[e](../docs/tutorial.md#step-2)\n";
    let tree = tree_of(&[
        ("docs/index.md", "# Docs\n"),
        ("docs/guide.md", text),
        ("docs/tutorial.md", "# Tutorial\n"),
    ])
    .await;
    let issues = validator(&tree, ValidationOptions::default())
        .validate_document("docs/guide")
        .await
        .unwrap();
    assert!(issues.is_empty(), "{:?}", issues);
}

#[tokio::test]
async fn test_validate_all_reports_in_reading_order() {
    let tree = tree_of(&[
        ("b.md", "---\nweight: 2\n---\n# B\n\n[x](./nowhere.md)\n"),
        ("a.md", "---\nweight: 1\n---\n# A\n\n[y](./elsewhere.md)\n"),
        ("c.md", "---\nweight: 3\n---\n# C\n"),
    ])
    .await;
    let report = validator(&tree, ValidationOptions::default())
        .validate_all()
        .await
        .unwrap();
    assert_eq!(report.documents_checked, 3);
    assert_eq!(report.error_count(), 2);
    assert!(report.has_errors());
    let files: Vec<&str> = report.issues.iter().map(|i| i.file.as_str()).collect();
    assert_eq!(files, vec!["a", "b"]);
}
