//! Tests of the `check` binary's resource-protocol framing

mod common;

use assert_cmd::Command;
use common::{BASE_REPO, commit_body, pr_entry};
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn check_cmd(cache: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("check").unwrap();
    cmd.env("CHECK_CACHE_DIR", cache.path());
    cmd
}

fn request_json(endpoint: &str) -> String {
    json!({"source": {"repo": BASE_REPO, "api_endpoint": endpoint}}).to_string()
}

#[test]
fn test_check_emits_versions_on_stdout() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("/repos/{BASE_REPO}/pulls").as_str())
        .match_query(Matcher::Exact("per_page=100&state=open".to_string()))
        .with_body(
            json!([pr_entry(1, "2011-04-14T16:00:00Z", "commit-a", Some(BASE_REPO))]).to_string(),
        )
        .create();
    server
        .mock("GET", format!("/repos/{BASE_REPO}/commits/commit-a").as_str())
        .with_body(commit_body("commit-a", "2011-04-14T15:00:00Z", None).to_string())
        .create();

    let cache = TempDir::new().unwrap();
    check_cmd(&cache)
        .write_stdin(request_json(&server.url()))
        .assert()
        .success()
        .stdout(
            r#"[{"ref":"commit-a","pr":"1","timestamp":"2011-04-14T16:00:00Z"}]
"#,
        );
}

#[test]
fn test_check_emits_empty_list_when_no_prs() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("/repos/{BASE_REPO}/pulls").as_str())
        .match_query(Matcher::Exact("per_page=100&state=open".to_string()))
        .with_body("[]")
        .create();

    let cache = TempDir::new().unwrap();
    check_cmd(&cache)
        .write_stdin(request_json(&server.url()))
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_malformed_request_fails_with_diagnostic() {
    let cache = TempDir::new().unwrap();
    check_cmd(&cache)
        .write_stdin("{ this is not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse check request"));
}

#[test]
fn test_remote_failure_exits_non_zero() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("/repos/{BASE_REPO}/pulls").as_str())
        .match_query(Matcher::Exact("per_page=100&state=open".to_string()))
        .with_status(500)
        .create();

    let cache = TempDir::new().unwrap();
    check_cmd(&cache)
        .write_stdin(request_json(&server.url()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("retrieval failed"));
}
