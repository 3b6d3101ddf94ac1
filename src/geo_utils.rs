//! # Geographic Utilities
//!
//! Core geographic computation used by the deduplicator, the exporter and the
//! region statistics.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`compute_bounds`] | Bounding box of a set of points |
//! | [`search_envelope`] | Degree box guaranteed to contain every point within a radius |
//!
//! ## Example
//!
//! ```rust
//! use waypoint_dedup::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(37.0, 127.0);
//! let b = GpsPoint::new(37.0009, 127.0);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! assert!((dist - 100.0).abs() < 1.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances assume a spherical Earth with radius [`EARTH_RADIUS_M`]
//! (6,371,000 m), not `geo`'s mean radius of 6,371,008.8 m.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{BoundingRect, MultiPoint, Point};
use crate::{Bounds, GpsPoint};

/// Earth radius used by [`haversine_distance`], in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Length of one degree of arc along a meridian, in meters.
const METERS_PER_DEGREE_ARC: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface. Symmetric in its
/// arguments and exactly zero for identical points.
///
/// # Example
///
/// ```rust
/// use waypoint_dedup::{GpsPoint, geo_utils};
///
/// let seoul = GpsPoint::new(37.5665, 126.9780);
/// let busan = GpsPoint::new(35.1796, 129.0756);
///
/// let distance = geo_utils::haversine_distance(&seoul, &busan);
/// assert!((distance - 325_000.0).abs() < 5_000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal inputs
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Degree half-widths `(d_lat, d_lng)` of a box around `center` that contains
/// every point whose haversine distance to `center` is at most `radius_m`.
///
/// The latitude span is exact for a sphere; the longitude span is widened by
/// the cosine of the most poleward latitude in the box plus a 50% margin. Within
/// ~5° of a pole the longitude span covers the whole globe.
pub fn search_envelope(center: &GpsPoint, radius_m: f64) -> (f64, f64) {
    let d_lat = radius_m.max(0.0) / METERS_PER_DEGREE_ARC;
    let extreme_lat = (center.latitude.abs() + d_lat).min(90.0);
    let cos = extreme_lat.to_radians().cos();

    let d_lng = if cos < 0.1 {
        360.0
    } else {
        (d_lat / cos * 1.5).min(360.0)
    };

    (d_lat, d_lng)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a set of GPS points.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use waypoint_dedup::{GpsPoint, geo_utils};
///
/// let points = vec![
///     GpsPoint::new(36.50, 126.30),
///     GpsPoint::new(36.80, 126.10),
///     GpsPoint::new(36.65, 126.20),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&points).unwrap();
/// assert_eq!(bounds.min_lat, 36.50);
/// assert_eq!(bounds.max_lat, 36.80);
/// assert_eq!(bounds.min_lng, 126.10);
/// assert_eq!(bounds.max_lng, 126.30);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into();

    let rect = multi.bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(36.7512, 126.1234);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let pairs = [
            (GpsPoint::new(37.0, 127.0), GpsPoint::new(37.0, 127.0009)),
            (GpsPoint::new(-33.9, 151.2), GpsPoint::new(51.5, -0.12)),
            (GpsPoint::new(89.9, 0.0), GpsPoint::new(-89.9, 179.9)),
        ];
        for (a, b) in pairs {
            assert!(approx_eq(haversine_distance(&a, &b), haversine_distance(&b, &a), 1e-6));
        }
    }

    #[test]
    fn test_haversine_distance_hundred_meter_fixture() {
        // 0.0009 degrees along a meridian is ~100.08m
        let a = GpsPoint::new(37.0, 127.0);
        let b = GpsPoint::new(37.0009, 127.0);
        let dist = haversine_distance(&a, &b);
        assert!(approx_eq(dist, 100.0, 1.0));

        // The same offset in longitude shrinks by cos(37°) to ~79.9m
        let c = GpsPoint::new(37.0, 127.0009);
        let dist = haversine_distance(&a, &c);
        assert!(approx_eq(dist, 79.93, 0.5));
    }

    #[test]
    fn test_haversine_distance_antipodal_is_finite() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 180.0);
        let dist = haversine_distance(&a, &b);
        assert!(dist.is_finite());
        assert!(approx_eq(dist, std::f64::consts::PI * EARTH_RADIUS_M, 1.0));
    }

    #[test]
    fn test_search_envelope_contains_radius() {
        let center = GpsPoint::new(37.0, 127.0);
        let (d_lat, d_lng) = search_envelope(&center, 10.0);

        // Points exactly 10m north and east must fall inside the box
        let north = GpsPoint::new(37.0 + 10.0 / METERS_PER_DEGREE_ARC, 127.0);
        assert!(haversine_distance(&center, &north) <= 10.0 + 1e-9);
        assert!(north.latitude - center.latitude <= d_lat + 1e-12);

        let east_lng = 127.0 + 10.0 / (METERS_PER_DEGREE_ARC * 37.0_f64.to_radians().cos());
        assert!(east_lng - center.longitude <= d_lng);
    }

    #[test]
    fn test_search_envelope_near_pole() {
        let (_, d_lng) = search_envelope(&GpsPoint::new(89.99, 10.0), 10.0);
        assert_eq!(d_lng, 360.0);
    }

    #[test]
    fn test_compute_bounds() {
        let points = vec![
            GpsPoint::new(36.50, 126.30),
            GpsPoint::new(36.80, 126.10),
            GpsPoint::new(36.65, 126.20),
        ];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min_lat, 36.50);
        assert_eq!(bounds.max_lat, 36.80);
        assert_eq!(bounds.min_lng, 126.10);
        assert_eq!(bounds.max_lng, 126.30);
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }
}
