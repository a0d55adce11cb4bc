//! The sync pipeline: from fetched OSM elements to reconciled stations.
//!
//! For each registry line the pipeline:
//! 1. Matches line-shaped elements by keyword and chains their geometry
//! 2. Locates, clusters and orders the station points along that geometry
//! 3. Reconciles the result with the previous output to keep ids stable
//!
//! [`Pipeline`] drives this per city and records everything in the run
//! report.

mod config;
mod error;
mod lines;
mod reconcile;
mod runner;
mod stations;


pub use config::RunOptions;
pub use error::CityError;
pub use lines::{
    LineShortfall, MatchedLine, UnregisteredLine, assemble_line, color_warnings,
    find_unregistered_lines,
};
pub use reconcile::{
    MemoryPrior, PriorStore, Reconciliation, StationDiff, UpdatedStation, reconcile,
};
pub use runner::Pipeline;
pub use stations::{
    Cluster, LineStations, LocatedStation, MATCH_THRESHOLD_METERS, StationSource,
    apply_manual_coords, cluster_candidates, is_eligible, is_preferred_station, is_station_like,
    locate_stations, pick_representative,
};
