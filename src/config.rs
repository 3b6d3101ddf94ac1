//! Run configuration and source layout.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dedup::DEFAULT_RADIUS_M;
use crate::error::{Error, Result};
use crate::{Region, RegionPolicy, SourceKind, DEFAULT_LON_BOUNDARY};
use crate::naming::NamePrefixes;

/// Configuration for a deduplication run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Waypoints within this distance of an accepted waypoint are dropped.
    /// Default: 10.0 meters
    pub radius_m: f64,

    /// Longitude separating the west and east regions; points exactly on it
    /// go east. Default: 127.5
    pub lon_boundary: f64,

    /// Skip duplicate removal entirely (partition and naming still run).
    /// Default: false
    pub skip_dedup: bool,

    /// Prefixes for non-reef and unclassified waypoints.
    pub prefixes: NamePrefixes,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            lon_boundary: DEFAULT_LON_BOUNDARY,
            skip_dedup: false,
            prefixes: NamePrefixes::default(),
        }
    }
}

/// One input file and how its waypoints are tagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File name, relative to the input directory
    pub file: String,
    pub kind: SourceKind,
    pub region: RegionPolicy,
}

impl SourceConfig {
    pub fn new(file: impl Into<String>, kind: SourceKind, region: RegionPolicy) -> Self {
        Self { file: file.into(), kind, region }
    }

    /// The standard layout of the fishing-point GPX directory.
    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig::new("chungnam_points.gpx", SourceKind::Reef, RegionPolicy::Static(Region::West)),
            SourceConfig::new("new_points_chungcheong.gpx", SourceKind::Other, RegionPolicy::Static(Region::West)),
            SourceConfig::new("gangwon_points.gpx", SourceKind::Reef, RegionPolicy::Static(Region::East)),
            SourceConfig::new("my_own_points.gpx", SourceKind::Own, RegionPolicy::ByLongitude),
        ]
    }

    /// Load a source list from a JSON file.
    ///
    /// ```json
    /// [
    ///   { "file": "chungnam_points.gpx", "kind": "reef", "region": { "static": "west" } },
    ///   { "file": "my_own_points.gpx", "kind": "own", "region": "by_longitude" }
    /// ]
    /// ```
    pub fn load_list(path: &Path) -> Result<Vec<SourceConfig>> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
