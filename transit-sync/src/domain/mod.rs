//! Domain types for the transit synchronization pipeline.
//!
//! These types enforce their invariants at construction time: a `LineId` is
//! always a valid identifier and a `BoundingBox` is always well-formed, so
//! the pipeline stages can trust them without re-validating.

mod coord;
mod element;
mod line_id;
mod station;

pub use coord::{BoundingBox, Coordinate, InvalidBoundingBox};
pub use element::{ElementGeometry, ElementId, ElementKind, RawElement, Tags};
pub use line_id::{InvalidLineId, LineId};
pub use station::{CanonicalStation, StationKey};
