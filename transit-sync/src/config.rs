//! Process configuration read from the environment.

use std::path::PathBuf;

use crate::matching::DEFAULT_MIN_SUGGESTION_SCORE;
use crate::pipeline::RunOptions;

/// Errors in environment values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A toggle was set to something other than a recognised boolean
    #[error("{name} must be one of 1/true/yes/on or 0/false/no/off, got {value:?}")]
    InvalidBool { name: String, value: String },

    /// A numeric setting did not parse
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: String, value: String },
}

/// Directories, endpoints and toggles for one process.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub registry_dir: PathBuf,
    pub output_dir: PathBuf,
    pub public_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub report_dir: PathBuf,

    /// Scope filter; `None` processes every registry.
    pub cities: Option<Vec<String>>,

    pub use_cache: bool,
    pub dry_run: bool,
    pub verify: bool,

    /// Deliver the report through the notifier after the run.
    pub notify: bool,

    pub min_suggestion_score: f64,

    /// Overrides the public Overpass endpoint.
    pub overpass_url: Option<String>,

    /// Overrides the public Nominatim endpoint.
    pub nominatim_url: Option<String>,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self {
            registry_dir: PathBuf::from("registry"),
            output_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public/data"),
            cache_dir: PathBuf::from(".cache/overpass"),
            report_dir: PathBuf::from("reports"),
            cities: None,
            use_cache: false,
            dry_run: false,
            verify: false,
            notify: false,
            min_suggestion_score: DEFAULT_MIN_SUGGESTION_SCORE,
            overpass_url: None,
            nominatim_url: None,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; unset or blank values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::new();

        if let Some(dir) = get("TRANSIT_SYNC_REGISTRY_DIR") {
            config.registry_dir = dir.into();
        }
        if let Some(dir) = get("TRANSIT_SYNC_OUTPUT_DIR") {
            config.output_dir = dir.into();
        }
        if let Some(dir) = get("TRANSIT_SYNC_PUBLIC_DIR") {
            config.public_dir = dir.into();
        }
        if let Some(dir) = get("TRANSIT_SYNC_CACHE_DIR") {
            config.cache_dir = dir.into();
        }
        if let Some(dir) = get("TRANSIT_SYNC_REPORT_DIR") {
            config.report_dir = dir.into();
        }

        if let Some(list) = get("TRANSIT_SYNC_CITIES") {
            let cities: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            config.cities = (!cities.is_empty()).then_some(cities);
        }

        for (name, flag) in [
            ("TRANSIT_SYNC_USE_CACHE", &mut config.use_cache),
            ("TRANSIT_SYNC_DRY_RUN", &mut config.dry_run),
            ("TRANSIT_SYNC_VERIFY", &mut config.verify),
            ("TRANSIT_SYNC_NOTIFY", &mut config.notify),
        ] {
            if let Some(value) = get(name) {
                *flag = parse_bool(name, &value)?;
            }
        }

        if let Some(value) = get("TRANSIT_SYNC_SUGGEST_SCORE") {
            config.min_suggestion_score = value
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite())
                .ok_or_else(|| ConfigError::InvalidNumber {
                    name: "TRANSIT_SYNC_SUGGEST_SCORE".to_string(),
                    value,
                })?;
        }

        config.overpass_url = get("OVERPASS_URL");
        config.nominatim_url = get("NOMINATIM_URL");
        Ok(config)
    }

    pub fn with_cities(mut self, cities: Vec<String>) -> Self {
        self.cities = Some(cities);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pipeline options derived from this configuration.
    pub fn run_options(&self) -> RunOptions {
        let options = RunOptions::new()
            .with_cache(self.use_cache)
            .with_dry_run(self.dry_run)
            .with_verify(self.verify)
            .with_min_suggestion_score(self.min_suggestion_score);
        match &self.cities {
            Some(cities) => options.with_cities(cities.clone()),
            None => options,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<SyncConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SyncConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.public_dir, PathBuf::from("public/data"));
        assert!(config.cities.is_none());
    }

    #[test]
    fn reads_directories_and_toggles() {
        let config = from_pairs(&[
            ("TRANSIT_SYNC_OUTPUT_DIR", "/srv/data"),
            ("TRANSIT_SYNC_USE_CACHE", "yes"),
            ("TRANSIT_SYNC_DRY_RUN", "ON"),
            ("TRANSIT_SYNC_VERIFY", "0"),
            ("TRANSIT_SYNC_SUGGEST_SCORE", "0.75"),
            ("OVERPASS_URL", "http://localhost:12345/api/interpreter"),
        ])
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/srv/data"));
        assert!(config.use_cache);
        assert!(config.dry_run);
        assert!(!config.verify);
        assert_eq!(config.min_suggestion_score, 0.75);
        assert_eq!(
            config.overpass_url.as_deref(),
            Some("http://localhost:12345/api/interpreter")
        );
    }

    #[test]
    fn city_list_is_trimmed() {
        let config = from_pairs(&[("TRANSIT_SYNC_CITIES", " nyc, ,paris ")]).unwrap();
        assert_eq!(
            config.cities,
            Some(vec!["nyc".to_string(), "paris".to_string()])
        );

        let config = from_pairs(&[("TRANSIT_SYNC_CITIES", " , ")]).unwrap();
        assert!(config.cities.is_none());
    }

    #[test]
    fn bad_values_are_errors() {
        let err = from_pairs(&[("TRANSIT_SYNC_DRY_RUN", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { ref name, .. } if name == "TRANSIT_SYNC_DRY_RUN"));

        let err = from_pairs(&[("TRANSIT_SYNC_SUGGEST_SCORE", "high")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn run_options_follow_config() {
        let options = SyncConfig::new()
            .with_cities(vec!["nyc".into()])
            .with_dry_run(true)
            .run_options();
        assert!(options.dry_run);
        assert!(options.includes("nyc"));
        assert!(!options.includes("paris"));
    }
}
