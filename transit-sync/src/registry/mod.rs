//! Per-city registry documents.
//!
//! A registry describes what to extract for one city: the bounding box,
//! the transport modes, the lines with their matching keywords, and the
//! operator-maintained alias, localized-name and manual-coordinate tables.
//! The pipeline only ever reads registries; seeding writes new drafts.

mod error;
mod store;
mod types;

pub use error::RegistryError;
pub use store::RegistryStore;
pub use types::{LineSpec, Registry};
