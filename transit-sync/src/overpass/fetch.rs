//! Per-city fetch with optional response caching.

use tracing::{debug, info, warn};

use crate::domain::RawElement;

use super::cache::{CachedResponse, ResponseCache};
use super::client::OverpassSource;
use super::error::FetchError;
use super::types::parse_response;

/// Where a fetched body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cache,
    Network,
}

/// Raw elements of a city together with their origin.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub elements: Vec<RawElement>,
    pub origin: FetchOrigin,
}

/// Fetches city data through a source, reading and filling a cache.
pub struct Fetcher<S, C> {
    source: S,
    cache: C,
}

impl<S: OverpassSource, C: ResponseCache> Fetcher<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Fetch the raw response body for a city.
    ///
    /// With `use_cache`, an existing entry is returned unmodified. Otherwise
    /// exactly one request is made and its body stored in the cache; a
    /// failed cache write is logged and does not fail the fetch.
    pub async fn fetch_body(
        &self,
        city: &str,
        query: &str,
        use_cache: bool,
    ) -> Result<(String, FetchOrigin), FetchError> {
        if use_cache && let Some(cached) = self.cache.get(city) {
            if cached.query != query {
                warn!(city, "Cached response was produced by a different query");
            }
            debug!(city, cached_at = cached.cached_at_secs, "Using cached response");
            return Ok((cached.body, FetchOrigin::Cache));
        }

        info!(city, "Querying Overpass");
        let body = self.source.execute(query).await?;

        if let Err(e) = self.cache.put(city, &CachedResponse::now(query, body.clone())) {
            warn!(city, error = %e, "Failed to cache response");
        }

        Ok((body, FetchOrigin::Network))
    }

    /// Fetch and parse a city's raw elements.
    pub async fn fetch_city(
        &self,
        city: &str,
        query: &str,
        use_cache: bool,
    ) -> Result<Fetched, FetchError> {
        let (body, origin) = self.fetch_body(city, query, use_cache).await?;
        let elements = parse_response(&body)?;
        Ok(Fetched { elements, origin })
    }
}
