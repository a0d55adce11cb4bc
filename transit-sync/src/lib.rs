//! Transit network sync from OpenStreetMap.
//!
//! For every city with a registry document, the pipeline queries the
//! Overpass API, assembles the configured lines from matching geometries,
//! locates and orders their stations, reconciles them against the previous
//! artifacts so identifiers stay stable, and writes GeoJSON artifacts plus a
//! run report for operators.

pub mod artifacts;
pub mod color;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod matching;
pub mod overpass;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod seed;
pub mod verify;
