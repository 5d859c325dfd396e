//! CLI integration tests for gitr-server init and repo commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use gitr_server::store::{SqliteStore, Store};
use gitr_server::types::PushRequest;
use predicates::prelude::*;
use serde_json::{Value, json};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitr-server").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn repo_json(&self, args: &[&str]) -> Value {
        let data_dir = self.data_dir_str();
        let mut full = vec!["repo"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--data-dir", data_dir.as_str(), "--json"]);

        let output = self.cmd().args(&full).output().expect("failed to run command");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized database"));

    assert!(ctx.data_dir().join("gitr.db").exists());
}

#[test]
fn test_init_is_idempotent() {
    let ctx = TestContext::new();

    ctx.init().success();
    let repo = ctx.repo_json(&["create", "keep-me"]);

    ctx.init().success();

    let repos = ctx.repo_json(&["list"]);
    let repos = repos.as_array().expect("repos not an array");
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0]["id"], repo["id"]);
}

#[test]
fn test_repo_commands_require_init() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["repo", "list", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gitr-server init"));
}

#[test]
fn test_repo_create_and_list() {
    let ctx = TestContext::new();
    ctx.init().success();

    let created = ctx.repo_json(&["create", "notes"]);
    assert_eq!(created["name"], "notes");
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));

    ctx.repo_json(&["create", "scratch"]);

    let repos = ctx.repo_json(&["list"]);
    let names: Vec<&str> = repos
        .as_array()
        .expect("repos not an array")
        .iter()
        .map(|r| r["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["scratch", "notes"]);
}

#[test]
fn test_repo_create_rejects_empty_name() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["repo", "create", "", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Repository name is required"));
}

#[test]
fn test_repo_list_empty() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["repo", "list", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No repositories found."));
}

#[test]
fn test_repo_show_reports_branches_and_commits() {
    let ctx = TestContext::new();
    ctx.init().success();

    let created = ctx.repo_json(&["create", "demo"]);
    let id = created["id"].as_str().expect("id").to_string();

    {
        let store = SqliteStore::new(ctx.data_dir().join("gitr.db")).expect("open store");
        let req: PushRequest = serde_json::from_value(json!({
            "branch": "feature",
            "commits": [
                { "hash": "a1", "message": "one" },
                { "hash": "a2", "message": "two" }
            ],
            "files": { "f.txt": "x" }
        }))
        .expect("push request");
        store.push(&id, &req).expect("push");
    }

    let shown = ctx.repo_json(&["show", &id]);
    assert_eq!(shown["name"], "demo");
    assert_eq!(shown["commit_count"], 2);
    assert_eq!(shown["branches"], json!(["main", "feature"]));
}

#[test]
fn test_repo_show_unknown_id_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["repo", "show", "nope", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Repository not found"));
}
