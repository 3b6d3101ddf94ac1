//! Greedy duplicate removal.
//!
//! Waypoints are visited in input order. A waypoint is dropped when it lies
//! within the radius (inclusive) of any waypoint already *accepted*; otherwise
//! it is accepted. Acceptance is final, so the result depends on input order:
//! with A, B, C spaced 8 m apart on a line and a 10 m radius, B is dropped
//! (near A) but C is kept (B was never accepted).
//!
//! [`deduplicate`] indexes accepted points in an R-tree and only computes the
//! haversine distance for candidates inside a conservative degree envelope.
//! [`deduplicate_linear`] is the direct O(n·m) scan; both return identical
//! results.

use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, search_envelope};
use crate::{GpsPoint, Waypoint};

/// Default duplicate radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 10.0;

/// An accepted waypoint position (used for spatial indexing).
#[derive(Debug, Clone, Copy)]
struct AcceptedPoint {
    point: GpsPoint,
}

impl RTreeObject for AcceptedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.longitude, self.point.latitude])
    }
}

/// Remove near-duplicates, keeping the first-seen waypoint of each cluster.
///
/// # Example
/// ```
/// use waypoint_dedup::{deduplicate, SourceKind, Waypoint};
///
/// let points = vec![
///     Waypoint::new(36.5000, 126.2000, SourceKind::Reef).with_name("first"),
///     Waypoint::new(36.50003, 126.2000, SourceKind::Reef).with_name("3m away"),
///     Waypoint::new(36.5010, 126.2000, SourceKind::Reef).with_name("110m away"),
/// ];
///
/// let unique = deduplicate(points, 10.0);
/// let names: Vec<_> = unique.iter().map(|w| w.name.as_str()).collect();
/// assert_eq!(names, ["first", "110m away"]);
/// ```
pub fn deduplicate(waypoints: Vec<Waypoint>, radius_m: f64) -> Vec<Waypoint> {
    let mut index: RTree<AcceptedPoint> = RTree::new();
    let mut accepted = Vec::with_capacity(waypoints.len());

    for wpt in waypoints {
        let candidate = wpt.position;
        let duplicate = search_boxes(&candidate, radius_m).iter().any(|envelope| {
            index
                .locate_in_envelope_intersecting(envelope)
                .any(|a| haversine_distance(&a.point, &candidate) <= radius_m)
        });

        if duplicate {
            debug!(
                "[dedup] dropping '{}' ({:.6}, {:.6}) from {}",
                wpt.display_label(),
                candidate.latitude,
                candidate.longitude,
                wpt.source_file
            );
            continue;
        }

        index.insert(AcceptedPoint { point: candidate });
        accepted.push(wpt);
    }

    accepted
}

/// Reference implementation of [`deduplicate`] as a plain nested scan.
pub fn deduplicate_linear(waypoints: Vec<Waypoint>, radius_m: f64) -> Vec<Waypoint> {
    let mut accepted: Vec<Waypoint> = Vec::with_capacity(waypoints.len());

    for wpt in waypoints {
        let duplicate = accepted
            .iter()
            .any(|a| haversine_distance(&a.position, &wpt.position) <= radius_m);
        if !duplicate {
            accepted.push(wpt);
        }
    }

    accepted
}

/// Envelopes to query around `center`; two when the box wraps the antimeridian.
fn search_boxes(center: &GpsPoint, radius_m: f64) -> Vec<AABB<[f64; 2]>> {
    let (d_lat, d_lng) = search_envelope(center, radius_m);
    let min_lat = center.latitude - d_lat;
    let max_lat = center.latitude + d_lat;

    if d_lng >= 180.0 {
        return vec![AABB::from_corners([-180.0, min_lat], [180.0, max_lat])];
    }

    let min_lng = center.longitude - d_lng;
    let max_lng = center.longitude + d_lng;
    let mut boxes = vec![AABB::from_corners([min_lng, min_lat], [max_lng, max_lat])];

    if min_lng < -180.0 {
        boxes.push(AABB::from_corners([min_lng + 360.0, min_lat], [180.0, max_lat]));
    }
    if max_lng > 180.0 {
        boxes.push(AABB::from_corners([-180.0, min_lat], [max_lng - 360.0, max_lat]));
    }

    boxes
}
