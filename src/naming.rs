//! Short-name generation.
//!
//! Each waypoint gets `{prefix}_{n:03}` where the prefix comes from its
//! source kind (or, for reef points, its category abbreviation) and `n`
//! counts up from 1 per prefix. Counts past 999 widen the field
//! (`사각_1000`). Counters live in a [`NameCounters`] owned by the caller, one
//! per region run.

use std::collections::BTreeMap;

use log::debug;

use crate::{CategoryTable, SourceKind, Waypoint};

/// Prefixes for waypoints that are not named after a reef category.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NamePrefixes {
    /// Prefix for [`SourceKind::Own`] points. Default: "내포인트"
    pub own: String,
    /// Prefix for [`SourceKind::Other`] points. Default: "포인트"
    pub other: String,
    /// Prefix for reef points the classifier cannot place. Default: "어초"
    pub uncategorized: String,
}

impl Default for NamePrefixes {
    fn default() -> Self {
        Self {
            own: "내포인트".to_string(),
            other: "포인트".to_string(),
            uncategorized: "어초".to_string(),
        }
    }
}

/// Per-prefix counters for one naming run.
#[derive(Debug, Clone, Default)]
pub struct NameCounters {
    counts: BTreeMap<String, u32>,
}

impl NameCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for `prefix` and return the new value (first call is 1).
    pub fn next(&mut self, prefix: &str) -> u32 {
        let count = self.counts.entry(prefix.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Names issued per prefix, sorted by prefix.
    pub fn histogram(&self) -> Vec<(String, u32)> {
        self.counts.iter().map(|(p, c)| (p.clone(), *c)).collect()
    }

    /// Total names issued.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// Format a short name. Zero-pads to three digits, never truncates.
///
/// ```
/// use waypoint_dedup::naming::format_short_name;
/// assert_eq!(format_short_name("사각", 7), "사각_007");
/// assert_eq!(format_short_name("사각", 1234), "사각_1234");
/// ```
pub fn format_short_name(prefix: &str, counter: u32) -> String {
    format!("{prefix}_{counter:03}")
}

/// Prefix for a waypoint.
pub fn prefix_for<'a>(
    waypoint: &Waypoint,
    table: &'a CategoryTable,
    prefixes: &'a NamePrefixes,
) -> &'a str {
    match waypoint.source() {
        SourceKind::Own => &prefixes.own,
        SourceKind::Other => &prefixes.other,
        SourceKind::Reef => table
            .classify(&waypoint.name, waypoint.note())
            .map(|rule| rule.abbreviation.as_str())
            .unwrap_or(&prefixes.uncategorized),
    }
}

/// Assign a short name to every waypoint, in slice order.
///
/// Any name already present is replaced.
///
/// # Example
/// ```
/// use waypoint_dedup::{assign_short_names, CategoryTable, NameCounters, NamePrefixes, SourceKind, Waypoint};
///
/// let mut points = vec![
///     Waypoint::new(36.50, 126.20, SourceKind::Reef).with_name("사각형어초"),
///     Waypoint::new(36.51, 126.21, SourceKind::Own),
///     Waypoint::new(36.52, 126.22, SourceKind::Reef).with_name("사각어초 보강"),
/// ];
///
/// let mut counters = NameCounters::new();
/// assign_short_names(&mut points, &CategoryTable::default(), &NamePrefixes::default(), &mut counters);
///
/// let names: Vec<_> = points.iter().map(|w| w.short_name.clone().unwrap()).collect();
/// assert_eq!(names, ["사각_001", "내포인트_001", "사각_002"]);
/// ```
pub fn assign_short_names(
    waypoints: &mut [Waypoint],
    table: &CategoryTable,
    prefixes: &NamePrefixes,
    counters: &mut NameCounters,
) {
    for wpt in waypoints.iter_mut() {
        let prefix = prefix_for(wpt, table, prefixes);
        let short = format_short_name(prefix, counters.next(prefix));
        debug!("[naming] '{}' -> {}", wpt.display_label(), short);
        wpt.short_name = Some(short);
    }
}
