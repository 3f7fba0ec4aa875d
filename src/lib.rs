//! Check resource for GitHub pull requests
//!
//! Enumerates the open pull requests of one repository as CI trigger
//! versions: each version is a head commit plus an effective timestamp, the
//! later of the pull request's creation time and its head commit's committer
//! time. Given the last emitted version, a check returns every version at or
//! after it, sorted ascending, never missing one and never re-triggering a
//! stale one.
//!
//! # Architecture
//!
//! ```text
//! CachedHttp (ETag-validated GET, persistent store)
//!     │
//! PullRequestFetcher (paginated listing + head commit enrichment)
//!     │
//! resolve (policy filters, effective timestamp, sort, gating)
//! ```
//!
//! The `check` binary frames this with the resource protocol: a JSON request
//! on stdin, the ordered version list on stdout.

pub mod cache;
pub mod check;
pub mod error;
pub mod fetch;
pub mod resolve;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    Candidate, CheckRequest, CommitInfo, Policy, PullRequestVersion, Source, Version,
};
