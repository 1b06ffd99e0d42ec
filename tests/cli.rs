use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn doctree_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_doctree"))
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write(&content, "index.md", "---\ntitle: Home\nweight: 1\n---\nWelcome.\n");
    write(
        &content,
        "docs/index.md",
        "---\nweight: 2\n---\n# Docs\n\nStart with the [guide](./guide.md).\n",
    );
    write(
        &content,
        "docs/guide.md",
        "---\nweight: 1\n---\n# Guide\n\n![Flow](img/flow.png)\n\nNext: [setup](setup.md).\n",
    );
    write(&content, "docs/img/flow.png", "png");
    write(&content, "docs/guide.fr.md", "# Guide FR\n");
    write(&content, "faq.md", "---\nweight: 3\n---\n# FAQ\n");

    let config_path = tmp.path().join("doctree.toml");
    fs::write(
        &config_path,
        "[content]\nroot = \"content\"\n\n\
         [validation]\ncheck_remote = false\n\n\
         [logging]\nlevel = \"warn\"\n",
    )
    .unwrap();
    (tmp, config_path)
}

fn run_doctree(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = doctree_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("DOCTREE_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run doctree binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_map_in_reading_order() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_doctree(&config, &["map", "--images"]);
    assert!(success, "map failed: {}", stderr);
    let expected = "\
├── Home
├── docs/
│   ├── Docs
│   └── Guide
│       └── [image] img/flow.png (Flow)
└── FAQ
";
    assert_eq!(stdout, expected);
}

#[test]
fn test_list_and_siblings() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_doctree(&config, &["list"]);
    assert!(success);
    let paths: Vec<&str> = stdout.lines().filter_map(|l| l.split('\t').next()).collect();
    assert_eq!(paths, vec!["index", "docs/index", "docs/guide", "faq"]);

    let (stdout, _, success) = run_doctree(&config, &["siblings", "docs/guide"]);
    assert!(success);
    assert_eq!(stdout, "docs/index\tDocs\ndocs/guide\tGuide\n");
}

#[test]
fn test_resolve() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) =
        run_doctree(&config, &["resolve", "./guide.en.md", "--from", "docs/index"]);
    assert!(success);
    assert_eq!(stdout.trim(), "docs/guide");

    let (stdout, _, success) = run_doctree(&config, &["resolve", "/docs/", "--from", "faq"]);
    assert!(success);
    assert_eq!(stdout.trim(), "docs/index");

    let (_, stderr, success) = run_doctree(&config, &["resolve", "./nope.md", "--from", "faq"]);
    assert!(!success);
    assert!(stderr.contains("does not resolve"));
}

#[test]
fn test_show_missing_path_fails() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_doctree(&config, &["show", "docs/guide"]);
    assert!(success);
    assert!(stdout.contains("source:       docs/guide.md"));

    let (_, _, success) = run_doctree(&config, &["show", "docs/absent"]);
    assert!(!success);
}

#[test]
fn test_validate_reports_broken_link() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_doctree(&config, &["validate"]);
    assert!(!success, "validate should fail on the broken setup link");
    assert!(stdout.contains("docs/guide:8:1: error [link/broken-link]"), "{}", stdout);
    assert!(stdout.contains("4 document(s) checked: 1 error(s), 0 warning(s)"), "{}", stdout);

    let (stdout, _, success) = run_doctree(&config, &["validate", "faq"]);
    assert!(success, "{}", stdout);

    let (_, _, success) = run_doctree(&config, &["validate", "--ignore", "^setup", "docs/guide"]);
    assert!(success);
}

#[test]
fn test_validate_json() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, _) = run_doctree(&config, &["validate", "--json", "--category", "link"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["documents_checked"], 4);
    assert_eq!(report["issues"][0]["category"], "link");
    assert_eq!(report["issues"][0]["severity"], "error");
    assert_eq!(report["issues"][0]["rule"], "broken-link");
}

#[test]
fn test_status_against_translation() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_doctree(&config, &["status", "--target", "fr"]);
    assert!(success, "{}", stderr);
    assert!(stdout.contains("stale   docs/guide"));
    assert!(stdout.contains("missing faq"));
}
