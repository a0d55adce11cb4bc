//! Optional cross-checking of new stations against a geocoder.
//!
//! Verification never blocks a run: every outcome, including failures, is
//! reduced to an optional note for the report.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{BoundingBox, Coordinate};
use crate::geometry::haversine_m;

/// Distance above which a geocoder hit is reported as suspicious.
pub const VERIFY_DISTANCE_METERS: f64 = 500.0;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Errors talking to a verification service.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}")]
    Api { status: u16 },

    #[error("unusable response: {0}")]
    Parse(String),
}

/// Checks a station name and position against an independent source.
pub trait StationVerifier {
    /// A note when the station looks wrong, `None` when it checks out.
    fn verify(
        &self,
        name: &str,
        coordinate: Coordinate,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<Option<String>, VerifyError>>;
}

/// Verifier that accepts everything; used when verification is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerifier;

impl StationVerifier for NoVerifier {
    async fn verify(
        &self,
        _name: &str,
        _coordinate: Coordinate,
        _bbox: &BoundingBox,
    ) -> Result<Option<String>, VerifyError> {
        Ok(None)
    }
}

/// Judge geocoder hits for a station; hits are in relevance order.
pub fn assess(name: &str, coordinate: Coordinate, hits: &[Coordinate]) -> Option<String> {
    let Some(best) = hits.first() else {
        return Some(format!("{name}: not found by geocoder"));
    };
    let distance = haversine_m(coordinate.into(), (*best).into());
    (distance > VERIFY_DISTANCE_METERS)
        .then(|| format!("{name}: geocoder places it {distance:.0} m away"))
}

/// Configuration for the Nominatim verifier.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause before every request; the public instance allows one per second.
    pub interval: Duration,
}

impl NominatimConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("transit-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            interval: Duration::from_secs(1),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl SearchHit {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat.parse().ok()?, self.lon.parse().ok()?))
    }
}

/// Verifier backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimVerifier {
    http: reqwest::Client,
    config: NominatimConfig,
}

impl NominatimVerifier {
    pub fn new(config: NominatimConfig) -> Result<Self, VerifyError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| VerifyError::Parse("invalid user agent".to_string()))?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    async fn search(&self, name: &str, bbox: &BoundingBox) -> Result<Vec<Coordinate>, VerifyError> {
        tokio::time::sleep(self.config.interval).await;

        // viewbox is x1,y1,x2,y2 = west,north,east,south
        let viewbox = format!("{},{},{},{}", bbox.west, bbox.north, bbox.east, bbox.south);
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", name),
                ("format", "jsonv2"),
                ("limit", "3"),
                ("bounded", "1"),
                ("viewbox", viewbox.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Api {
                status: status.as_u16(),
            });
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| VerifyError::Parse(e.to_string()))?;
        debug!(name, hits = hits.len(), "Geocoder search");
        Ok(hits.iter().filter_map(SearchHit::coordinate).collect())
    }
}

impl StationVerifier for NominatimVerifier {
    async fn verify(
        &self,
        name: &str,
        coordinate: Coordinate,
        bbox: &BoundingBox,
    ) -> Result<Option<String>, VerifyError> {
        let hits = self.search(name, bbox).await?;
        Ok(assess(name, coordinate, &hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_found_is_noted() {
        let note = assess("Elm St", Coordinate::new(40.7, -74.0), &[]);
        assert_eq!(note.as_deref(), Some("Elm St: not found by geocoder"));
    }

    #[test]
    fn nearby_hit_passes() {
        let at = Coordinate::new(40.7, -74.0);
        assert_eq!(assess("Elm St", at, &[Coordinate::new(40.7020, -74.0)]), None);
    }

    #[test]
    fn distant_hit_is_noted() {
        let at = Coordinate::new(40.7, -74.0);
        // 0.01 degrees of latitude is about 1.1 km.
        let note = assess("Elm St", at, &[Coordinate::new(40.71, -74.0), at]).unwrap();
        assert!(note.starts_with("Elm St: geocoder places it 11"));
    }

    #[test]
    fn hit_coordinates_parse_from_strings() {
        let hit: SearchHit =
            serde_json::from_str(r#"{"lat": "40.7", "lon": "-74.0", "display_name": "x"}"#).unwrap();
        assert_eq!(hit.coordinate(), Some(Coordinate::new(40.7, -74.0)));
    }

    #[tokio::test]
    async fn no_verifier_accepts() {
        let bbox = BoundingBox::new(40.70, -74.02, 40.78, -73.95).unwrap();
        let note = NoVerifier
            .verify("Elm St", Coordinate::new(40.7, -74.0), &bbox)
            .await
            .unwrap();
        assert!(note.is_none());
    }

    #[test]
    fn verifier_construction() {
        let config = NominatimConfig::new().with_base_url("http://localhost:8080/");
        assert!(NominatimVerifier::new(config).is_ok());
    }
}
