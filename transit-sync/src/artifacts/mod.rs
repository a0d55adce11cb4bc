//! Published artifacts: line metadata, route geometries and stations.
//!
//! Each city gets three documents under `<output>/<city>/`:
//! - `lines.json`: line id to display metadata, keys sorted
//! - `routes.json`: a FeatureCollection of route segments
//! - `features.json`: a FeatureCollection of station points
//!
//! plus a public mirror `<public>/<city>.json` holding the route features
//! followed by the station features. The last written artifacts double as
//! the prior dataset of the next run.

mod error;
mod features;
mod model;
mod writer;

pub use error::ArtifactError;
pub use features::{
    collection, parse_collection, route_from_feature, route_to_feature, station_from_feature,
    station_to_feature,
};
pub use model::{Dataset, LineMetadata, RouteFeature, RouteGeometry, build_dataset};
pub use writer::{ArtifactWriter, FEATURES_FILE, LINES_FILE, ROUTES_FILE};
