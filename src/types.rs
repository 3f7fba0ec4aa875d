//! Core types for github-pr-resource

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default API endpoint (public GitHub)
pub const DEFAULT_API_ENDPOINT: &str = "https://api.github.com";

/// Marker substring that excludes a head commit from triggering CI
///
/// The match is case-sensitive and applies to the full commit message.
pub const CI_SKIP_MARKER: &str = "[ci skip]";

/// Resource source configuration
///
/// Deserialized from the `source` object of the check request. Field names
/// follow the resource's pipeline configuration schema.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    /// Target repository in `owner/name` form
    pub repo: String,
    /// Restrict candidates to pull requests targeting this base branch
    #[serde(default)]
    pub base: Option<String>,
    /// Drop pull requests whose head lives in a fork
    #[serde(default)]
    pub disable_forks: bool,
    /// Drop pull requests whose head commit message carries the ci-skip marker
    #[serde(default)]
    pub ci_skip: bool,
    /// Token sent as `Authorization: Bearer` on every API call
    #[serde(default)]
    pub access_token: Option<String>,
    /// API endpoint override (GitHub Enterprise); defaults to public GitHub
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Accept invalid TLS certificates (self-hosted instances)
    #[serde(default)]
    pub skip_ssl_verification: bool,
}

impl Source {
    /// The API endpoint to use, without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.api_endpoint
            .as_deref()
            .map_or(DEFAULT_API_ENDPOINT, |e| e.trim_end_matches('/'))
    }

    /// Filter policy derived from the source flags
    pub const fn policy(&self) -> Policy {
        Policy {
            exclude_forks: self.disable_forks,
            exclude_ci_skip: self.ci_skip,
        }
    }
}

/// Candidate filter policy (configuration, not persisted)
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    /// Drop candidates whose head repository differs from the base repository
    pub exclude_forks: bool,
    /// Drop candidates whose head commit message contains [`CI_SKIP_MARKER`]
    pub exclude_ci_skip: bool,
}

/// Last-known version supplied back in by the pipeline
///
/// Only the timestamp is authoritative for gating; a stale or unknown `ref`
/// is not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Version {
    /// Head commit hash of the previously emitted version
    #[serde(rename = "ref", default)]
    pub commit_ref: Option<String>,
    /// Effective timestamp of the previously emitted version (RFC 3339)
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Version {
    /// Parse the timestamp, if present
    ///
    /// Returns [`Error::InvalidVersionTimestamp`] when the field exists but
    /// does not parse; `check::run` relaxes that to an initial check.
    ///
    /// [`Error::InvalidVersionTimestamp`]: crate::error::Error::InvalidVersionTimestamp
    pub fn parsed_timestamp(&self) -> crate::error::Result<Option<DateTime<Utc>>> {
        match self.timestamp.as_deref() {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|e| {
                    crate::error::Error::InvalidVersionTimestamp(format!("{raw:?}: {e}"))
                }),
        }
    }
}

/// A full check request as framed by the pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    /// Resource source configuration
    pub source: Source,
    /// Last version emitted by a previous check, if any
    #[serde(default)]
    pub version: Option<Version>,
}

/// One open pull request as returned by the listing endpoint
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Pull request number
    pub number: u64,
    /// When the pull request was opened
    pub created_at: DateTime<Utc>,
    /// Head commit hash
    pub head_sha: String,
    /// Full name of the head repository (None when the fork was deleted)
    pub head_repo: Option<String>,
    /// Full name of the base repository
    pub base_repo: String,
}

impl Candidate {
    /// Whether the head lives in a different repository than the base
    ///
    /// A deleted head repository counts as a fork.
    pub fn is_fork(&self) -> bool {
        self.head_repo.as_deref() != Some(self.base_repo.as_str())
    }
}

/// Head commit details fetched per candidate
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Commit hash
    pub sha: String,
    /// Committer timestamp (raised by force-pushes)
    pub committed_at: DateTime<Utc>,
    /// Full commit message
    pub message: String,
}

impl CommitInfo {
    /// Whether the commit message carries the ci-skip marker
    pub fn skips_ci(&self) -> bool {
        self.message.contains(CI_SKIP_MARKER)
    }
}

/// One emitted version: a pull request at a specific head commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestVersion {
    /// Head commit hash
    #[serde(rename = "ref")]
    pub commit_ref: String,
    /// Pull request number, stringified
    pub pr: String,
    /// Effective timestamp, RFC 3339 with `Z` suffix
    pub timestamp: String,
}

/// Format a timestamp the way emitted versions carry it
///
/// Seconds precision, UTC, `Z` suffix: `2011-04-14T16:00:00Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_uses_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2011, 4, 14, 16, 0, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2011-04-14T16:00:00Z");
    }

    #[test]
    fn test_fork_detection() {
        let mut candidate = Candidate {
            number: 1,
            created_at: Utc::now(),
            head_sha: "abc".to_string(),
            head_repo: Some("me/repo".to_string()),
            base_repo: "me/repo".to_string(),
        };
        assert!(!candidate.is_fork());

        candidate.head_repo = Some("forker/repo".to_string());
        assert!(candidate.is_fork());

        // Deleted head repository counts as a fork
        candidate.head_repo = None;
        assert!(candidate.is_fork());
    }

    #[test]
    fn test_version_timestamp_parses_rfc3339() {
        let version = Version {
            commit_ref: Some("abc".to_string()),
            timestamp: Some("2011-04-14T16:00:00Z".to_string()),
        };
        let ts = version.parsed_timestamp().unwrap().unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2011, 4, 14, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_version_timestamp_absent() {
        let version = Version::default();
        assert!(version.parsed_timestamp().unwrap().is_none());
    }

    #[test]
    fn test_version_timestamp_garbage_is_an_error() {
        let version = Version {
            commit_ref: None,
            timestamp: Some("not-a-date".to_string()),
        };
        assert!(version.parsed_timestamp().is_err());
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let source: Source = serde_json::from_str(
            r#"{"repo": "me/repo", "api_endpoint": "https://ghe.example.com/api/v3/"}"#,
        )
        .unwrap();
        assert_eq!(source.endpoint(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_source_defaults() {
        let source: Source = serde_json::from_str(r#"{"repo": "me/repo"}"#).unwrap();
        assert_eq!(source.endpoint(), DEFAULT_API_ENDPOINT);
        assert!(!source.disable_forks);
        assert!(!source.ci_skip);
        let policy = source.policy();
        assert!(!policy.exclude_forks);
        assert!(!policy.exclude_ci_skip);
    }
}
