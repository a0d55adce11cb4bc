//! Overpass API HTTP client.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use super::error::FetchError;

/// Default Overpass interpreter endpoint.
const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent; Overpass operators ask clients to identify themselves.
const DEFAULT_USER_AGENT: &str = concat!("transit-sync/", env!("CARGO_PKG_VERSION"));

/// Anything that can answer an Overpass QL query with a raw JSON body.
pub trait OverpassSource {
    fn execute(&self, query: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl OverpassConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 180,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom interpreter URL (mirrors, local instances, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for an Overpass API interpreter.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    base_url: String,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| FetchError::Api {
            status: 0,
            message: "Invalid user agent".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl OverpassSource for OverpassClient {
    /// POST the query and return the raw response body.
    async fn execute(&self, query: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .post(&self.base_url)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = OverpassConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 180);
        assert!(config.user_agent.starts_with("transit-sync/"));
    }

    #[test]
    fn config_builder() {
        let config = OverpassConfig::new()
            .with_base_url("http://localhost:12345/api/interpreter")
            .with_timeout(30)
            .with_user_agent("test-agent");

        assert_eq!(config.base_url, "http://localhost:12345/api/interpreter");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn client_creation() {
        let client = OverpassClient::new(OverpassConfig::new());
        assert!(client.is_ok());
    }

    #[test]
    fn invalid_user_agent_rejected() {
        let client = OverpassClient::new(OverpassConfig::new().with_user_agent("bad\nagent"));
        assert!(matches!(client, Err(FetchError::Api { .. })));
    }
}
