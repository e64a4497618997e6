// Region-to-map-level resolution for map charts

use std::collections::BTreeSet;

use tracing::debug;

use crate::gazetteer::{Gazetteer, Granularity, GAZETTEER, NATION_MAP_ID};

/// The map a set of place names should be drawn on.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLevel {
    pub granularity: Granularity,
    pub map_id: String,
    pub center: (f64, f64),
    pub zoom: f64,
}

impl MapLevel {
    /// Level for an explicit map id; unknown ids fall back to the nation.
    pub fn for_map_id(gazetteer: &Gazetteer, map_id: &str) -> Self {
        let area = gazetteer.area_or_nation(map_id);
        Self {
            granularity: area.granularity,
            map_id: area.map_id.to_string(),
            center: area.center,
            zoom: area.zoom,
        }
    }

    pub fn nation(gazetteer: &Gazetteer) -> Self {
        Self::for_map_id(gazetteer, NATION_MAP_ID)
    }
}

/// Resolve place names against the shared gazetteer.
pub fn resolve_map_level<S: AsRef<str>>(names: &[S]) -> MapLevel {
    resolve_with(&GAZETTEER, names)
}

/// Classify place names into a map level. Never fails: anything
/// unrecognized or ambiguous resolves to the nation map.
pub fn resolve_with<S: AsRef<str>>(gazetteer: &Gazetteer, names: &[S]) -> MapLevel {
    let names: Vec<&str> = names.iter().map(|n| n.as_ref().trim()).collect();
    let map_id = classify(gazetteer, &names);
    debug!(?names, map_id, "resolved map level");
    MapLevel::for_map_id(gazetteer, map_id)
}

fn classify(gazetteer: &Gazetteer, names: &[&str]) -> &'static str {
    if names.is_empty() {
        return NATION_MAP_ID;
    }

    // A single province
    if let [only] = names {
        if let Some(map_id) = gazetteer.province(only) {
            return map_id;
        }
    }

    // Cities that each have their own map, all in one province
    let mapped: Option<Vec<(&'static str, &'static str)>> = names
        .iter()
        .map(|n| gazetteer.city(n).and_then(|c| c.map_id.map(|m| (c.province, m))))
        .collect();
    if let Some(mapped) = mapped {
        let provinces: BTreeSet<&str> = mapped.iter().map(|(p, _)| *p).collect();
        if provinces.len() == 1 {
            return match mapped.as_slice() {
                [(_, city_map)] => *city_map,
                [(province, _), ..] => *province,
                [] => NATION_MAP_ID,
            };
        }
    }

    // Cities that all belong to one province
    let provinces: Option<BTreeSet<&'static str>> =
        names.iter().map(|n| gazetteer.city(n).map(|c| c.province)).collect();
    if let Some(provinces) = provinces {
        if provinces.len() == 1 {
            if let Some(province) = provinces.into_iter().next() {
                return province;
            }
        }
    }

    // Several provinces, or anything else
    NATION_MAP_ID
}
