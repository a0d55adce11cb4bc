//! Staggered bulk detail fetch used when seeding registries.
//!
//! Seeding needs the full geometry of a list of known relations, ways or
//! nodes. The requests are independent, so they run concurrently, but
//! request `i` is held back by `stagger * i` to keep the aggregate rate
//! under the public instance's abuse threshold.

use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::domain::{ElementId, RawElement};

use super::client::OverpassSource;
use super::error::FetchError;
use super::types::parse_response;

/// Default delay between consecutive request starts (~30 requests/second).
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(34);

/// Overpass query returning one element with inline geometry.
pub fn element_query(id: ElementId, timeout_secs: u32) -> String {
    format!(
        "[out:json][timeout:{timeout_secs}];\n{}({});\nout geom;\n",
        id.kind.as_str(),
        id.id
    )
}

/// Issues many single-element queries with a fixed per-request stagger.
pub struct BulkFetcher<S> {
    source: S,
    stagger: Duration,
    timeout_secs: u32,
}

impl<S: OverpassSource> BulkFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stagger: DEFAULT_STAGGER,
            timeout_secs: 60,
        }
    }

    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Start delay of the request at `index`.
    pub fn delay_for(&self, index: usize) -> Duration {
        self.stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Fetch every element in `ids`; results come back in input order.
    ///
    /// A failure for one id does not affect the others.
    pub async fn fetch_details(
        &self,
        ids: &[ElementId],
    ) -> Vec<(ElementId, Result<Vec<RawElement>, FetchError>)> {
        let requests = ids.iter().enumerate().map(|(index, &id)| {
            let delay = self.delay_for(index);
            async move {
                tokio::time::sleep(delay).await;
                debug!(element = %id, "Fetching element details");
                let result = match self
                    .source
                    .execute(&element_query(id, self.timeout_secs))
                    .await
                {
                    Ok(body) => parse_response(&body),
                    Err(e) => Err(e),
                };
                (id, result)
            }
        });

        join_all(requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers relation queries with a route, fails everything else.
    struct RouteSource {
        queries: Mutex<Vec<String>>,
    }

    impl OverpassSource for RouteSource {
        async fn execute(&self, query: &str) -> Result<String, FetchError> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.contains("relation(") {
                Ok(r#"{"elements": [{"type": "relation", "id": 7, "members": [
                    {"type": "way", "ref": 1, "role": "",
                     "geometry": [{"lat": 0, "lon": 0}, {"lat": 0, "lon": 1}]}
                ], "tags": {"name": "Red Line", "ref": "R"}}]}"#
                    .to_string())
            } else {
                Err(FetchError::RateLimited)
            }
        }
    }

    #[test]
    fn query_shape() {
        assert_eq!(
            element_query(ElementId::relation(42), 25),
            "[out:json][timeout:25];\nrelation(42);\nout geom;\n"
        );
    }

    #[test]
    fn delay_grows_linearly() {
        let fetcher = BulkFetcher::new(RouteSource {
            queries: Mutex::new(vec![]),
        });
        assert_eq!(fetcher.delay_for(0), Duration::ZERO);
        assert_eq!(fetcher.delay_for(1), DEFAULT_STAGGER);
        assert_eq!(fetcher.delay_for(30), DEFAULT_STAGGER * 30);
    }

    #[tokio::test]
    async fn results_keep_input_order_and_isolate_failures() {
        let fetcher = BulkFetcher::new(RouteSource {
            queries: Mutex::new(vec![]),
        })
        .with_stagger(Duration::from_millis(1));

        let ids = [ElementId::relation(7), ElementId::way(3), ElementId::relation(7)];
        let results = fetcher.fetch_details(&ids).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, ElementId::relation(7));
        assert_eq!(results[0].1.as_ref().unwrap().len(), 1);
        assert!(matches!(results[1].1, Err(FetchError::RateLimited)));
        assert!(results[2].1.is_ok());
        assert_eq!(fetcher.source.queries.lock().unwrap().len(), 3);
    }
}
