//! Per-run options for the sync pipeline.

use chrono::NaiveDate;

use crate::matching::DEFAULT_MIN_SUGGESTION_SCORE;
use crate::overpass::DEFAULT_QUERY_TIMEOUT_SECS;

/// Options controlling a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Reuse cached Overpass responses when present.
    pub use_cache: bool,

    /// Compute everything but write no artifacts.
    pub dry_run: bool,

    /// Check new stations against the verifier.
    pub verify: bool,

    /// Only process these cities; `None` means every registry.
    pub cities: Option<Vec<String>>,

    /// Minimum score for suggesting a line for an unregistered geometry.
    pub min_suggestion_score: f64,

    /// Server-side Overpass timeout in seconds.
    pub query_timeout_secs: u32,

    /// Date used for opening-date checks; defaults to today (UTC).
    pub today: Option<NaiveDate>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self {
            use_cache: false,
            dry_run: false,
            verify: false,
            cities: None,
            min_suggestion_score: DEFAULT_MIN_SUGGESTION_SCORE,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            today: None,
        }
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_cities(mut self, cities: Vec<String>) -> Self {
        self.cities = Some(cities);
        self
    }

    pub fn with_min_suggestion_score(mut self, score: f64) -> Self {
        self.min_suggestion_score = score;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Whether `city` is in scope for this run.
    pub fn includes(&self, city: &str) -> bool {
        self.cities
            .as_ref()
            .is_none_or(|cities| cities.iter().any(|c| c == city))
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = RunOptions::default();
        assert!(!options.use_cache);
        assert!(!options.dry_run);
        assert!(options.includes("anything"));
        assert_eq!(options.min_suggestion_score, DEFAULT_MIN_SUGGESTION_SCORE);
    }

    #[test]
    fn scope_filter() {
        let options = RunOptions::new().with_cities(vec!["nyc".into(), "paris".into()]);
        assert!(options.includes("nyc"));
        assert!(!options.includes("tokyo"));
    }
}
