//! Response caches keyed by city.
//!
//! Cached responses have no expiry: the cache exists so that a run can be
//! repeated against exactly the same source data, and it is only consulted
//! when the caller asks for it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use moka::sync::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::FetchError;

/// A raw Overpass response together with the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    /// Unix timestamp when the response was fetched.
    pub cached_at_secs: u64,
    pub query: String,
    pub body: String,
}

impl CachedResponse {
    /// Wrap a freshly fetched body, stamped with the current time.
    pub fn now(query: &str, body: String) -> Self {
        let cached_at_secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            cached_at_secs,
            query: query.to_string(),
            body,
        }
    }
}

/// Key-value store of responses by city.
pub trait ResponseCache {
    /// The cached response for `city`, if any.
    fn get(&self, city: &str) -> Option<CachedResponse>;

    /// Store the response for `city`, replacing any previous entry.
    fn put(&self, city: &str, response: &CachedResponse) -> Result<(), FetchError>;
}

/// Disk cache storing one `<dir>/<city>.json` file per city.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, city: &str) -> PathBuf {
        self.dir.join(format!("{city}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResponseCache for DiskCache {
    /// Returns `None` if the entry doesn't exist or can't be parsed.
    fn get(&self, city: &str) -> Option<CachedResponse> {
        let path = self.path_for(city);
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(cached) => Some(cached),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Creates the cache directory if it doesn't exist.
    fn put(&self, city: &str, response: &CachedResponse) -> Result<(), FetchError> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| FetchError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string(response).map_err(|e| FetchError::Cache {
            message: format!("failed to serialize cache entry: {}", e),
        })?;

        std::fs::write(self.path_for(city), json).map_err(|e| FetchError::Cache {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }
}

/// In-memory cache, for tests and throwaway runs.
#[derive(Clone)]
pub struct MemoryCache {
    entries: MokaCache<String, Arc<CachedResponse>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().max_capacity(1024).build(),
        }
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, city: &str) -> Option<CachedResponse> {
        self.entries.get(city).map(|r| (*r).clone())
    }

    fn put(&self, city: &str, response: &CachedResponse) -> Result<(), FetchError> {
        self.entries
            .insert(city.to_string(), Arc::new(response.clone()));
        Ok(())
    }
}
