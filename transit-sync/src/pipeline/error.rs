//! Errors that abort the processing of one city.

use crate::artifacts::ArtifactError;
use crate::overpass::FetchError;
use crate::registry::RegistryError;

/// A failure that stops one city; the run continues with the next.
#[derive(Debug, thiserror::Error)]
pub enum CityError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
