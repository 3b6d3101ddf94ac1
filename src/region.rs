//! West/east region partitioning.
//!
//! Most source collections belong wholly to one sea and carry a static
//! region. Collections recorded across both coasts are split per point by
//! longitude: anything at or east of the boundary goes east.

use crate::Waypoint;

/// Default west/east boundary (degrees east), running down the Korean peninsula.
pub const DEFAULT_LON_BOUNDARY: f64 = 127.5;

/// Output region bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    West,
    East,
}

impl Region {
    /// Label used in GPX metadata and console output.
    pub fn label(&self) -> &'static str {
        match self {
            Region::West => "West Sea (서해)",
            Region::East => "East Sea (동해)",
        }
    }

    /// Output file name for this region.
    pub fn file_name(&self) -> &'static str {
        match self {
            Region::West => "west_result.gpx",
            Region::East => "east_result.gpx",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::West => f.write_str("west"),
            Region::East => f.write_str("east"),
        }
    }
}

/// How a source collection is assigned to regions.
///
/// Serialized as `{"static": "west"}` or `"by_longitude"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    /// Every point goes to the given region
    Static(Region),
    /// Each point is compared to the longitude boundary
    ByLongitude,
}

/// Region for a single waypoint under `policy`.
///
/// # Example
/// ```
/// use waypoint_dedup::{partition, Region, RegionPolicy, SourceKind, Waypoint};
///
/// let wpt = Waypoint::new(37.8, 128.9, SourceKind::Own);
/// assert_eq!(partition(&wpt, RegionPolicy::ByLongitude, 127.5), Region::East);
/// assert_eq!(partition(&wpt, RegionPolicy::Static(Region::West), 127.5), Region::West);
/// ```
#[inline]
pub fn partition(waypoint: &Waypoint, policy: RegionPolicy, lon_boundary: f64) -> Region {
    match policy {
        RegionPolicy::Static(region) => region,
        RegionPolicy::ByLongitude => {
            if waypoint.longitude() < lon_boundary {
                Region::West
            } else {
                Region::East
            }
        }
    }
}
