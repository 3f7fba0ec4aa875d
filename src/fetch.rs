//! Paginated candidate fetcher
//!
//! Lists open pull requests for one repository and enriches each candidate
//! with its head commit's committer timestamp and message. Every request goes
//! through the shared validated cache, so an unchanged remote costs one
//! revalidation round-trip per URL instead of a full download.

use crate::cache::ValidatedFetch;
use crate::error::{Error, Result};
use crate::types::{Candidate, CommitInfo};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;
use url::Url;

/// Page size for the listing endpoint (the API maximum).
const PER_PAGE: &str = "100";

/// Worker bound for per-candidate commit lookups.
const COMMIT_LOOKUP_CONCURRENCY: usize = 8;

// Strict intermediate shapes for the loosely-typed API payloads. Missing
// required fields fail deserialization instead of flowing downstream.

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    created_at: DateTime<Utc>,
    head: RawHead,
    base: RawBase,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
    // null when the fork the head lived in was deleted
    repo: Option<RawRepo>,
}

#[derive(Debug, Deserialize)]
struct RawBase {
    repo: RawRepo,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    full_name: String,
}

impl From<RawPullRequest> for Candidate {
    fn from(raw: RawPullRequest) -> Self {
        Self {
            number: raw.number,
            created_at: raw.created_at,
            head_sha: raw.head.sha,
            head_repo: raw.head.repo.map(|r| r.full_name),
            base_repo: raw.base.repo.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    committer: RawCommitter,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitter {
    date: DateTime<Utc>,
}

impl From<RawCommit> for CommitInfo {
    fn from(raw: RawCommit) -> Self {
        Self {
            sha: raw.sha,
            committed_at: raw.commit.committer.date,
            message: raw.commit.message,
        }
    }
}

/// Fetches and enriches open pull requests for one repository
pub struct PullRequestFetcher {
    http: Arc<dyn ValidatedFetch>,
    endpoint: String,
    repo: String,
}

impl PullRequestFetcher {
    /// Create a fetcher for `repo` (in `owner/name` form) against `endpoint`.
    pub fn new(http: Arc<dyn ValidatedFetch>, endpoint: &str, repo: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            repo: repo.to_string(),
        }
    }

    /// List all open pull requests, following pagination to the end.
    ///
    /// Candidates come back in the order the remote returned them; the
    /// resolution engine owns the final ordering.
    pub async fn list_open(&self, base_branch: Option<&str>) -> Result<Vec<Candidate>> {
        let mut url = self.listing_url(base_branch)?;
        let mut candidates = Vec::new();

        loop {
            debug!(url = %url, "fetching pull request page");
            let page = self.http.fetch(&url).await?;

            let raw: Vec<RawPullRequest> = serde_json::from_str(&page.body)
                .map_err(|e| Error::MalformedResponse(format!("pull request list from {url}: {e}")))?;
            candidates.extend(raw.into_iter().map(Candidate::from));

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = candidates.len(), "listed open pull requests");
        Ok(candidates)
    }

    /// Fetch commit details for every distinct head sha.
    ///
    /// Lookups are independent, so they run concurrently under a bounded
    /// worker count. Any single failure aborts the whole fetch: new-version
    /// detection needs complete information, not a best-effort subset.
    pub async fn commit_infos(
        &self,
        candidates: &[Candidate],
    ) -> Result<HashMap<String, CommitInfo>> {
        let mut shas: Vec<String> = candidates.iter().map(|c| c.head_sha.clone()).collect();
        shas.sort_unstable();
        shas.dedup();

        let limiter = Arc::new(Semaphore::new(COMMIT_LOOKUP_CONCURRENCY));
        let mut lookups = JoinSet::new();

        for sha in shas {
            let http = Arc::clone(&self.http);
            let limiter = Arc::clone(&limiter);
            let url = format!("{}/repos/{}/commits/{}", self.endpoint, self.repo, sha);

            lookups.spawn(async move {
                let _permit = limiter
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Retrieval(format!("commit lookup pool closed: {e}")))?;
                fetch_commit(http.as_ref(), &url).await
            });
        }

        let mut by_sha = HashMap::new();
        while let Some(joined) = lookups.join_next().await {
            let info = joined
                .map_err(|e| Error::Retrieval(format!("commit lookup task failed: {e}")))??;
            by_sha.insert(info.sha.clone(), info);
        }

        debug!(count = by_sha.len(), "fetched head commit details");
        Ok(by_sha)
    }

    fn listing_url(&self, base_branch: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&format!("{}/repos/{}/pulls", self.endpoint, self.repo))
            .map_err(|e| Error::Retrieval(format!("invalid listing URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("per_page", PER_PAGE)
            .append_pair("state", "open");
        if let Some(base) = base_branch {
            url.query_pairs_mut().append_pair("base", base);
        }

        Ok(url.into())
    }
}

async fn fetch_commit(http: &dyn ValidatedFetch, url: &str) -> Result<CommitInfo> {
    debug!(url, "fetching head commit");
    let outcome = http.fetch(url).await?;

    let raw: RawCommit = serde_json::from_str(&outcome.body)
        .map_err(|e| Error::MalformedResponse(format!("commit from {url}: {e}")))?;
    Ok(raw.into())
}
