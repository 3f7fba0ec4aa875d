//! Check orchestration
//!
//! Wires the persistent cache, the fetcher, and the resolution engine into
//! the single pass a check invocation performs.

use crate::cache::{CacheStore, CachedHttp};
use crate::error::Result;
use crate::fetch::PullRequestFetcher;
use crate::resolve::resolve;
use crate::types::{CheckRequest, PullRequestVersion};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Run one check: list, enrich, resolve.
///
/// `cache_dir` roots the validated-response store that survives across
/// invocations. An unparseable last-known timestamp downgrades to an initial
/// check (full candidate set) with a warning instead of aborting; every other
/// error is fatal because a partial or misordered version list would break
/// the trigger.
pub async fn run(request: &CheckRequest, cache_dir: &Path) -> Result<Vec<PullRequestVersion>> {
    let source = &request.source;

    let store = CacheStore::open(cache_dir)?;
    let http = CachedHttp::new(
        store,
        source.access_token.clone(),
        source.skip_ssl_verification,
    )?;

    let fetcher = PullRequestFetcher::new(Arc::new(http), source.endpoint(), &source.repo);

    let candidates = fetcher.list_open(source.base.as_deref()).await?;
    let commits = fetcher.commit_infos(&candidates).await?;

    let cutoff = match request.version.as_ref() {
        None => None,
        Some(version) => match version.parsed_timestamp() {
            Ok(ts) => ts,
            // Documented relaxation: fall back to an initial check rather
            // than failing the invocation over a bad marker.
            Err(e) => {
                warn!(error = %e, "treating check as initial");
                None
            }
        },
    };

    debug!(candidates = candidates.len(), cutoff = ?cutoff, "resolving versions");
    resolve(candidates, &commits, source.policy(), cutoff)
}
