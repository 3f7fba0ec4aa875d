//! `check` binary: resource-protocol framing around the check engine.
//!
//! Reads a JSON request from stdin, writes the ordered version list as JSON
//! to stdout. Diagnostics go to stderr so they never corrupt the protocol
//! stream; any failure exits non-zero and the pipeline re-invokes on its
//! schedule.

use anyhow::Context;
use github_pr_resource::{CheckRequest, check};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cache directory override, mainly for tests and sandboxed runners.
const CACHE_DIR_ENV: &str = "CHECK_CACHE_DIR";

fn cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("github-pr-resource")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read check request from stdin")?;

    let request: CheckRequest =
        serde_json::from_str(&input).context("failed to parse check request")?;

    let versions = check::run(&request, &cache_dir())
        .await
        .context("check failed")?;

    let output = serde_json::to_string(&versions).context("failed to serialize versions")?;
    println!("{output}");
    Ok(())
}
