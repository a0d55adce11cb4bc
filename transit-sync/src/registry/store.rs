//! Directory-backed registry store.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::RegistryError;
use super::types::Registry;

/// Registry documents stored as `<dir>/<city>.json`.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    dir: PathBuf,
}

impl RegistryStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All cities with a registry document, sorted by name.
    pub fn cities(&self) -> Result<Vec<String>, RegistryError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| RegistryError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut cities = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_city(stem) => cities.push(stem.to_string()),
                _ => debug!(path = %path.display(), "Skipping file with unusable city name"),
            }
        }

        cities.sort();
        Ok(cities)
    }

    pub fn path_for(&self, city: &str) -> Result<PathBuf, RegistryError> {
        if !is_valid_city(city) {
            return Err(RegistryError::InvalidCity(city.to_string()));
        }
        Ok(self.dir.join(format!("{city}.json")))
    }

    pub fn exists(&self, city: &str) -> bool {
        self.path_for(city).map(|p| p.exists()).unwrap_or(false)
    }

    /// Load and validate the registry of one city.
    pub fn load(&self, city: &str) -> Result<Registry, RegistryError> {
        let path = self.path_for(city)?;
        let json = std::fs::read_to_string(&path).map_err(|e| RegistryError::Io {
            path: path.clone(),
            source: e,
        })?;
        Registry::from_json(city, &json)
    }

    /// Write a registry document, creating the directory if needed.
    pub fn save(&self, city: &str, registry: &Registry) -> Result<PathBuf, RegistryError> {
        registry.validate()?;
        let path = self.path_for(city)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| RegistryError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut json =
            serde_json::to_string_pretty(registry).map_err(|e| RegistryError::Malformed {
                city: city.to_string(),
                message: e.to_string(),
            })?;
        json.push('\n');

        std::fs::write(&path, json).map_err(|e| RegistryError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

/// City names double as file stems: lowercase ASCII, digits, `-`, `_`.
fn is_valid_city(city: &str) -> bool {
    !city.is_empty()
        && city
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}
