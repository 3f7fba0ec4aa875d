//! Conditional HTTP cache
//!
//! Wraps outbound GET requests with an entity-tag validation cache keyed by
//! full request URL. The cache knows nothing about pagination or pull-request
//! semantics; it stores whatever the remote returned, including the raw
//! `Link: rel="next"` target so a 304 revalidation can reuse it.

mod store;

pub use store::{CacheEntry, CacheStore};

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, IF_NONE_MATCH, LINK, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Mutex;
use tracing::debug;

/// Result of one validated fetch
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Response body (stored body verbatim on a 304)
    pub body: String,
    /// Next-page URL from the `Link` header, if any
    pub next: Option<String>,
    /// Whether the body was served from the cache via revalidation
    pub from_cache: bool,
}

/// Seam for issuing cached GET requests
///
/// The fetcher depends on this trait rather than on a concrete client so
/// tests can substitute fixture-backed implementations.
#[async_trait]
pub trait ValidatedFetch: Send + Sync {
    /// Fetch `url`, revalidating any stored entry.
    async fn fetch(&self, url: &str) -> Result<FetchOutcome>;
}

/// Validated-cache HTTP client for the GitHub REST API
///
/// Known entries are revalidated with `If-None-Match`; a 304 answer reuses
/// the stored body without mutating the store, a 200 overwrites the entry
/// when the response carries an ETag. Any other status is a retrieval error
/// and leaves the store untouched.
pub struct CachedHttp {
    client: Client,
    store: Mutex<CacheStore>,
    token: Option<String>,
}

impl CachedHttp {
    /// Create a client around an opened store.
    ///
    /// `token`, when present, is sent as a bearer authorization on every
    /// request. `skip_ssl_verification` is for self-hosted instances with
    /// certificates the system trust store does not know.
    pub fn new(store: CacheStore, token: Option<String>, skip_ssl_verification: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(skip_ssl_verification)
            .build()
            .map_err(|e| Error::Retrieval(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            store: Mutex::new(store),
            token,
        })
    }
}

#[async_trait]
impl ValidatedFetch for CachedHttp {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        // Clone the entry out so the lock is not held across the request.
        let cached = self.store.lock().unwrap().get(url).cloned();

        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, "github-pr-resource")
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(entry) = &cached {
            request = request.header(IF_NONE_MATCH, entry.etag.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Retrieval(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            let Some(entry) = cached else {
                return Err(Error::Retrieval(format!(
                    "{url} returned 304 but no cache entry exists"
                )));
            };
            debug!(url, "cache hit (304)");
            return Ok(FetchOutcome {
                body: entry.body,
                next: entry.next,
                from_cache: true,
            });
        }

        if !status.is_success() {
            return Err(Error::Retrieval(format!("{url} returned {status}")));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);

        let body = response
            .text()
            .await
            .map_err(|e| Error::Retrieval(format!("failed to read body from {url}: {e}")))?;

        // Only validated responses are worth keeping.
        if let Some(etag) = etag {
            debug!(url, "caching validated response");
            self.store.lock().unwrap().insert(
                url,
                CacheEntry {
                    etag,
                    body: body.clone(),
                    next: next.clone(),
                },
            )?;
        }

        Ok(FetchOutcome {
            body,
            next,
            from_cache: false,
        })
    }
}

/// Extract the `rel="next"` target from a `Link` header value.
///
/// The header looks like:
/// `<https://api.github.com/...&page=2>; rel="next", <...>; rel="last"`
fn next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim() == r#"rel="next""#);
        if is_next {
            return Some(target.trim_start_matches('<').trim_end_matches('>').to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_link_single_relation() {
        let header = r#"<https://api.github.com/repos/me/repo/pulls?page=2>; rel="next""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/repos/me/repo/pulls?page=2")
        );
    }

    #[test]
    fn test_next_link_among_other_relations() {
        let header = concat!(
            r#"<https://api.github.com/x?page=1>; rel="prev", "#,
            r#"<https://api.github.com/x?page=3>; rel="next", "#,
            r#"<https://api.github.com/x?page=9>; rel="last""#,
        );
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/x?page=3")
        );
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/x?page=1>; rel="first""#;
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn test_next_link_empty_header() {
        assert_eq!(next_link(""), None);
    }
}
