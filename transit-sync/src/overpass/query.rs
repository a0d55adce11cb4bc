//! Overpass QL query construction.
//!
//! Building a query is a pure function of the registry: identical
//! registries produce byte-identical queries, which the response cache
//! relies on.

use std::collections::BTreeSet;

use crate::registry::Registry;

/// Default server-side timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 180;

/// Modes tagged with `aerialway=*` rather than `railway=*`.
const AERIAL_MODES: &[&str] = &["cable_car", "gondola", "chair_lift", "mixed_lift", "drag_lift"];

/// Values of `railway=*` on station-like nodes.
const RAILWAY_POINT_VALUES: &str = "station|halt|tram_stop|stop";

/// Values of `public_transport=*` on station-like nodes.
const PT_POINT_VALUES: &str = "station|stop_position";

/// Tag namespace a transport mode is queried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeClass {
    /// `railway=<mode>` ways, `route=<mode>` relations.
    Rail,
    /// `aerialway=<mode>` ways, `route=aerialway` relations.
    Aerial,
}

impl ModeClass {
    pub fn of(mode: &str) -> Self {
        if AERIAL_MODES.contains(&mode) {
            ModeClass::Aerial
        } else {
            ModeClass::Rail
        }
    }
}

/// Reduce a mode name to `[a-z0-9_]`, dropping everything else.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_mode(mode: &str) -> Option<String> {
    let cleaned: String = mode
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Sanitized, de-duplicated, sorted modes split by class.
fn classify_modes(modes: &[String]) -> (Vec<String>, Vec<String>) {
    let unique: BTreeSet<String> = modes.iter().filter_map(|m| sanitize_mode(m)).collect();
    unique
        .into_iter()
        .partition(|m| ModeClass::of(m) == ModeClass::Rail)
}

/// Build the Overpass query for a registry.
///
/// Requests, inside the bounding box: rail-mode ways and route relations,
/// aerial-mode ways and aerialway route relations, and every node tagged as
/// a station or stop position. Geometry is returned inline (`out geom`).
pub fn build_query(registry: &Registry, timeout_secs: u32) -> String {
    let (rail, aerial) = classify_modes(&registry.modes);
    let mut q = format!(
        "[out:json][timeout:{timeout_secs}][bbox:{}];\n(\n",
        registry.bbox.to_overpass()
    );

    if !rail.is_empty() {
        let alternation = rail.join("|");
        q.push_str(&format!("  way[\"railway\"~\"^({alternation})$\"];\n"));
        q.push_str(&format!("  relation[\"route\"~\"^({alternation})$\"];\n"));
    }
    if !aerial.is_empty() {
        let alternation = aerial.join("|");
        q.push_str(&format!("  way[\"aerialway\"~\"^({alternation})$\"];\n"));
        q.push_str("  relation[\"route\"=\"aerialway\"];\n");
    }

    q.push_str(&format!(
        "  node[\"railway\"~\"^({RAILWAY_POINT_VALUES})$\"];\n"
    ));
    q.push_str(&format!(
        "  node[\"public_transport\"~\"^({PT_POINT_VALUES})$\"];\n"
    ));
    q.push_str("  node[\"aerialway\"=\"station\"];\n");
    q.push_str(");\nout geom;\n");
    q
}
