//! Reading and writing a city's artifact files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use geojson::Feature;
use tracing::{debug, info, warn};

use crate::domain::LineId;
use crate::pipeline::PriorStore;

use super::error::ArtifactError;
use super::features::{
    collection, parse_collection, route_from_feature, route_to_feature, station_from_feature,
    station_to_feature,
};
use super::model::{Dataset, LineMetadata};

pub const LINES_FILE: &str = "lines.json";
pub const ROUTES_FILE: &str = "routes.json";
pub const FEATURES_FILE: &str = "features.json";

/// Writes artifacts to `<output>/<city>/` and the public mirror to
/// `<public>/<city>.json`.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    public_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            public_dir: public_dir.into(),
        }
    }

    pub fn city_dir(&self, city: &str) -> PathBuf {
        self.output_dir.join(city)
    }

    pub fn public_path(&self, city: &str) -> PathBuf {
        self.public_dir.join(format!("{city}.json"))
    }

    /// Write all artifacts of a city.
    ///
    /// Every file is staged next to its target before any is renamed into
    /// place, so a failed write leaves the previous set untouched.
    ///
    /// Returns the paths written.
    pub fn write(&self, city: &str, dataset: &Dataset) -> Result<Vec<PathBuf>, ArtifactError> {
        let route_features = dataset
            .routes
            .iter()
            .map(route_to_feature)
            .collect::<Result<Vec<Feature>, _>>()?;
        let station_features = dataset
            .stations
            .iter()
            .map(station_to_feature)
            .collect::<Result<Vec<Feature>, _>>()?;

        let dir = self.city_dir(city);
        let lines_path = dir.join(LINES_FILE);
        let routes_path = dir.join(ROUTES_FILE);
        let features_path = dir.join(FEATURES_FILE);
        let public_path = self.public_path(city);

        let lines_json = to_json(&dataset.lines)?;
        let routes_json = to_json(&collection(route_features.clone()))?;
        let features_json = to_json(&collection(station_features.clone()))?;
        let mut mirror = route_features;
        mirror.extend(station_features);
        let public_json = to_json(&collection(mirror))?;

        let mut staged = Vec::with_capacity(4);
        for (path, contents) in [
            (&lines_path, &lines_json),
            (&routes_path, &routes_json),
            (&features_path, &features_json),
            (&public_path, &public_json),
        ] {
            match stage(path, contents) {
                Ok(tmp) => staged.push((tmp, path)),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }
        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(tmp, path) {
                discard(&staged[i..]);
                return Err(ArtifactError::io(path, e));
            }
        }

        info!(
            city,
            lines = dataset.lines.len(),
            routes = dataset.routes.len(),
            stations = dataset.stations.len(),
            "Wrote artifacts"
        );
        Ok(vec![lines_path, routes_path, features_path, public_path])
    }

    /// Load the last artifacts of a city.
    ///
    /// A city that was never written yields an empty dataset; each missing
    /// file counts as empty on its own.
    pub fn load_prior(&self, city: &str) -> Result<Dataset, ArtifactError> {
        let dir = self.city_dir(city);

        let lines: BTreeMap<LineId, LineMetadata> = match read_optional(&dir.join(LINES_FILE))? {
            Some(text) => serde_json::from_str(&text)?,
            None => BTreeMap::new(),
        };

        let routes = match read_optional(&dir.join(ROUTES_FILE))? {
            Some(text) => parse_collection(&text)?
                .features
                .iter()
                .map(route_from_feature)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let stations = match read_optional(&dir.join(FEATURES_FILE))? {
            Some(text) => parse_collection(&text)?
                .features
                .iter()
                .map(station_from_feature)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        debug!(city, stations = stations.len(), "Loaded prior artifacts");
        Ok(Dataset {
            lines,
            routes,
            stations,
        })
    }
}

impl PriorStore for ArtifactWriter {
    fn load(&self, city: &str) -> Result<Dataset, ArtifactError> {
        self.load_prior(city)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ArtifactError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

fn read_optional(path: &Path) -> Result<Option<String>, ArtifactError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ArtifactError::io(path, e)),
    }
}

/// Write `contents` to a sibling temporary file of `path`.
fn stage(path: &Path, contents: &str) -> Result<PathBuf, ArtifactError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents).map_err(|e| ArtifactError::io(&tmp, e))?;
    Ok(tmp)
}

fn discard(staged: &[(PathBuf, &PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = std::fs::remove_file(tmp) {
            warn!(path = %tmp.display(), error = %e, "Failed to remove staged artifact");
        }
    }
}
