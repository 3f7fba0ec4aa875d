//! Shared fixtures for integration tests
//!
//! These are test utilities - not all may be used by every test file.

#![allow(dead_code)]

use github_pr_resource::{CheckRequest, PullRequestVersion, check};
use serde_json::{Value, json};
use std::path::Path;

/// Default base repository used by fixtures.
pub const BASE_REPO: &str = "acme/widgets";

/// Build one entry of the pull-request listing payload.
pub fn pr_entry(number: u64, created_at: &str, sha: &str, head_repo: Option<&str>) -> Value {
    json!({
        "number": number,
        "created_at": created_at,
        "head": {
            "sha": sha,
            "repo": head_repo.map(|name| json!({"full_name": name})),
        },
        "base": {"repo": {"full_name": BASE_REPO}},
    })
}

/// Build a single-commit payload.
pub fn commit_body(sha: &str, date: &str, message: Option<&str>) -> Value {
    let mut commit = json!({"committer": {"date": date}});
    if let Some(message) = message {
        commit["message"] = json!(message);
    }
    json!({"sha": sha, "commit": commit})
}

/// Run a check against `endpoint` with the given source overrides and
/// optional last-known version.
pub async fn run_check(
    endpoint: &str,
    cache_dir: &Path,
    source_extra: Value,
    version: Option<Value>,
) -> github_pr_resource::Result<Vec<PullRequestVersion>> {
    let mut source = json!({"repo": BASE_REPO, "api_endpoint": endpoint});
    if let Value::Object(extra) = source_extra {
        source.as_object_mut().unwrap().extend(extra);
    }

    let mut request = json!({"source": source});
    if let Some(version) = version {
        request["version"] = version;
    }

    let request: CheckRequest = serde_json::from_value(request).unwrap();
    check::run(&request, cache_dir).await
}

/// Shorthand for the expected output entries.
pub fn version(commit_ref: &str, pr: &str, timestamp: &str) -> PullRequestVersion {
    PullRequestVersion {
        commit_ref: commit_ref.to_string(),
        pr: pr.to_string(),
        timestamp: timestamp.to_string(),
    }
}
