//! Overpass API access: query building, fetching and caching.
//!
//! Key characteristics of the Overpass API:
//! - It is a shared public service with a global rate limit, so the
//!   pipeline issues one query per city and processes cities sequentially
//! - Responses can report runtime errors (timeouts, memory exhaustion) in a
//!   `remark` field while still answering 200
//! - With `out geom`, ways and relation members carry their coordinates
//!   inline, so no separate node lookups are needed for a city sync

mod bulk;
mod cache;
mod client;
mod error;
mod fetch;
mod query;
mod types;

pub use bulk::{BulkFetcher, DEFAULT_STAGGER, element_query};
pub use cache::{CachedResponse, DiskCache, MemoryCache, ResponseCache};
pub use client::{OverpassClient, OverpassConfig, OverpassSource};
pub use error::FetchError;
pub use fetch::{FetchOrigin, Fetched, Fetcher};
pub use query::{DEFAULT_QUERY_TIMEOUT_SECS, ModeClass, build_query, sanitize_mode};
pub use types::{OverpassElement, OverpassResponse, parse_response};
