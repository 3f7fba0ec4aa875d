//! Durable storage for validated responses.
//!
//! One JSON file holding a URL-keyed map. The check runs as a fresh process
//! on every poll, so entries must survive restarts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Filename for the serialized entry map.
const STORE_FILE: &str = "http-cache.json";

/// A validated response retained for conditional revalidation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Entity tag the remote returned with this body
    pub etag: String,
    /// Raw response body
    pub body: String,
    /// `Link: rel="next"` target, kept because a 304 may omit the header
    #[serde(default)]
    pub next: Option<String>,
}

/// URL-keyed store of validated responses, persisted as a single file
///
/// Entries never expire on their own; a newer 200 overwrites them. Lookups
/// and overwrites are the only operations the cache needs.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    /// Open the store rooted at `dir`, loading any persisted entries.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// discarded with a warning: the cache is disposable and correctness
    /// never depends on it.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);

        let entries = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "discarding corrupt cache file");
                    HashMap::new()
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding unreadable cache file");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Look up the entry for a request URL.
    pub fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Insert or overwrite the entry for a request URL and persist the store.
    pub fn insert(&mut self, url: &str, entry: CacheEntry) -> Result<()> {
        self.entries.insert(url.to_string(), entry);
        self.save()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .map_err(|e| Error::Cache(format!("failed to create {}: {e}", dir.display())))?;
        }

        let content = serde_json::to_string(&self.entries)
            .map_err(|e| Error::Cache(format!("failed to serialize cache: {e}")))?;

        fs::write(&self.path, content)
            .map_err(|e| Error::Cache(format!("failed to write {}: {e}", self.path.display())))
    }
}
