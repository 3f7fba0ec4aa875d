//! Version resolution engine
//!
//! Consumes enriched candidates and produces the ordered version list:
//! policy filters, effective-timestamp derivation, stable ascending sort,
//! and gating against the last known version's timestamp.
//!
//! The engine is stateless between invocations; all memory of prior runs
//! lives in the gating input and the persistent HTTP cache.

use crate::error::{Error, Result};
use crate::types::{Candidate, CommitInfo, Policy, PullRequestVersion, format_timestamp};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Resolve enriched candidates into the ordered version list.
///
/// A candidate's effective timestamp is the later of its creation time and
/// its head commit's committer time, so a force-push can move a pull request
/// later in the ordering even though it was opened earlier. Ties keep the
/// filtered list's relative order (the sort is stable; there is no secondary
/// key).
///
/// When `cutoff` is present, only entries with an effective timestamp at or
/// after it survive, the matching entry included, so re-running with the last
/// emitted version reproduces that version first. Without a cutoff this is
/// the initial check and the full sorted set comes back.
pub fn resolve(
    candidates: Vec<Candidate>,
    commits: &HashMap<String, CommitInfo>,
    policy: Policy,
    cutoff: Option<DateTime<Utc>>,
) -> Result<Vec<PullRequestVersion>> {
    let mut entries: Vec<(DateTime<Utc>, Candidate)> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let info = commits.get(&candidate.head_sha).ok_or_else(|| {
            Error::MalformedResponse(format!(
                "no commit details for head {} of pull request {}",
                candidate.head_sha, candidate.number
            ))
        })?;

        if policy.exclude_forks && candidate.is_fork() {
            debug!(pr = candidate.number, "dropping fork");
            continue;
        }
        if policy.exclude_ci_skip && info.skips_ci() {
            debug!(pr = candidate.number, "dropping ci-skipped head commit");
            continue;
        }

        let effective = candidate.created_at.max(info.committed_at);
        entries.push((effective, candidate));
    }

    // Stable sort on the single ordering key.
    entries.sort_by_key(|(effective, _)| *effective);

    let versions = entries
        .into_iter()
        .filter(|(effective, _)| cutoff.is_none_or(|c| *effective >= c))
        .map(|(effective, candidate)| PullRequestVersion {
            commit_ref: candidate.head_sha,
            pr: candidate.number.to_string(),
            timestamp: format_timestamp(effective),
        })
        .collect();

    Ok(versions)
}
