//! Draft registries for new cities.
//!
//! Seeding starts from a bounding box and a hand-picked list of OSM route
//! relations. Each relation becomes one line of the draft; operators then
//! prune keywords, add aliases and commit the document.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::color::normalize_hex;
use crate::domain::{BoundingBox, ElementId, LineId, RawElement};
use crate::overpass::{BulkFetcher, OverpassSource, sanitize_mode};
use crate::registry::{LineSpec, Registry, RegistryError, RegistryStore};

/// Errors that stop a seed.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The city already has a registry; seeding never overwrites one
    #[error("registry for {0} already exists")]
    Exists(String),

    /// None of the requested relations could be fetched
    #[error("no usable relations for {0}")]
    NoRelations(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result of a successful seed.
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub path: PathBuf,
    pub registry: Registry,
    /// Relations that were requested but did not make it into the draft.
    pub skipped: Vec<(ElementId, String)>,
}

/// Build a draft registry from fetched route relations.
///
/// Relations without a usable name are skipped. A `ref` becomes the line id
/// when it is a valid id not already taken, otherwise `r<relation id>`.
pub fn draft_registry(bbox: BoundingBox, relations: &[RawElement]) -> Registry {
    let mut taken: HashSet<LineId> = HashSet::new();
    let mut modes = BTreeSet::new();
    let mut lines = Vec::new();

    for relation in relations {
        let tags = &relation.tags;
        let reference = tags.get("ref").map(str::trim).filter(|r| !r.is_empty());
        let Some(name) = tags
            .get("name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or(reference)
        else {
            warn!(element = %relation.id, "Relation has neither name nor ref");
            continue;
        };

        let id = reference
            .and_then(|r| LineId::parse(r).ok())
            .filter(|id| !taken.contains(id))
            .or_else(|| LineId::parse(&format!("r{}", relation.id.id)).ok());
        let Some(id) = id.filter(|id| !taken.contains(id)) else {
            warn!(element = %relation.id, "No usable line id");
            continue;
        };
        taken.insert(id.clone());

        let mut keywords = vec![name.to_string()];
        if let Some(r) = reference
            && r != name
        {
            keywords.push(r.to_string());
        }

        if let Some(mode) = tags.get("route").and_then(sanitize_mode) {
            modes.insert(mode);
        }

        lines.push(LineSpec {
            id,
            name: name.to_string(),
            keywords,
            color: tags.get("colour").and_then(normalize_hex),
            icon: None,
            order: None,
            allow_single_segment: false,
        });
    }

    Registry {
        bbox,
        modes: modes.into_iter().collect(),
        local_languages: Vec::new(),
        lines,
        station_aliases: BTreeMap::new(),
        station_local_names: BTreeMap::new(),
        manual_coords: BTreeMap::new(),
    }
}

/// Fetch `relations` and write a draft registry for `city`.
pub async fn seed_city<S: OverpassSource>(
    store: &RegistryStore,
    fetcher: &BulkFetcher<S>,
    city: &str,
    bbox: BoundingBox,
    relations: &[i64],
) -> Result<SeedOutcome, SeedError> {
    // Validates the city name before any request goes out.
    store.path_for(city)?;
    if store.exists(city) {
        return Err(SeedError::Exists(city.to_string()));
    }

    let ids: Vec<ElementId> = relations.iter().map(|&id| ElementId::relation(id)).collect();
    let mut fetched = Vec::new();
    let mut skipped = Vec::new();
    for (id, result) in fetcher.fetch_details(&ids).await {
        match result {
            Ok(elements) => match elements.into_iter().find(|el| el.id == id) {
                Some(relation) => fetched.push(relation),
                None => skipped.push((id, "no geometry returned".to_string())),
            },
            Err(e) => {
                warn!(element = %id, error = %e, "Relation fetch failed");
                skipped.push((id, e.to_string()));
            }
        }
    }

    let registry = draft_registry(bbox, &fetched);
    if registry.lines.is_empty() {
        return Err(SeedError::NoRelations(city.to_string()));
    }
    let path = store.save(city, &registry)?;
    info!(
        city,
        lines = registry.lines.len(),
        skipped = skipped.len(),
        path = %path.display(),
        "Draft registry written"
    );
    Ok(SeedOutcome {
        path,
        registry,
        skipped,
    })
}
