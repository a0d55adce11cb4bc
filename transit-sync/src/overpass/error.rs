//! Overpass fetch error types.

/// Errors that can occur while fetching data for a city.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the API
    #[error("rate limited by Overpass API")]
    RateLimited,

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Overpass answered 200 but reported a runtime error in `remark`
    #[error("Overpass runtime error: {0}")]
    Remark(String),

    /// Cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },
}
