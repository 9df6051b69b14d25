//! # Geographic Utilities
//!
//! Low-level geometric helpers shared by the boundary, track-file and heatmap modules.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`compute_bounds`] | Bounding box of a coordinate sequence |
//! | [`compute_center`] | Arithmetic mean of a coordinate sequence (map centering) |
//! | [`coords_coincide`] | Equality within the ring-closure tolerance |
//! | [`is_closed`] | First and last coordinate coincide |
//! | [`distinct_count`] | Number of distinct coordinates, ignoring order |
//! | [`dedup_consecutive`] | Drop repeated consecutive coordinates |
//! | [`ring_is_simple`] | A closed ring has no self-intersections |
//!
//! ## Coordinate System
//!
//! All functions take WGS84 degrees. [`LatLon`] keeps the (latitude, longitude) display
//! order; `geo` types use x = longitude, y = latitude.

use std::collections::HashSet;

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString};

use crate::{Bounds, LatLon};

/// Two coordinates closer than this (in degrees, per axis) are the same vertex.
pub const RING_CLOSURE_TOLERANCE_DEG: f64 = 1e-9;

/// Meters per degree of latitude (spherical approximation).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

// =============================================================================
// Bounding Box / Center
// =============================================================================

/// Compute the bounding box of a coordinate sequence.
///
/// Returns `None` for an empty slice.
///
/// ```rust
/// use hotspot_matcher::{LatLon, geo_utils};
///
/// let ring = vec![LatLon::new(-16.4, -58.5), LatLon::new(-23.6, -52.1)];
/// let bounds = geo_utils::compute_bounds(&ring).unwrap();
/// assert_eq!(bounds.min_lat, -23.6);
/// assert_eq!(bounds.max_lng, -52.1);
/// ```
pub fn compute_bounds(points: &[LatLon]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

/// Arithmetic mean of the given coordinates.
///
/// This is what the property map centers on, so a closing duplicate vertex
/// pulls the center slightly towards the first point. Empty input returns (0, 0).
pub fn compute_center(points: &[LatLon]) -> LatLon {
    if points.is_empty() {
        return LatLon::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    LatLon::new(sum_lat / n, sum_lng / n)
}

// =============================================================================
// Ring Helpers
// =============================================================================

#[inline]
pub fn coords_coincide(a: &LatLon, b: &LatLon) -> bool {
    (a.latitude - b.latitude).abs() <= RING_CLOSURE_TOLERANCE_DEG
        && (a.longitude - b.longitude).abs() <= RING_CLOSURE_TOLERANCE_DEG
}

/// True if the sequence has at least two points and its ends coincide.
pub fn is_closed(points: &[LatLon]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => coords_coincide(first, last),
        _ => false,
    }
}

/// Number of distinct coordinates (exact comparison).
pub fn distinct_count(points: &[LatLon]) -> usize {
    points
        .iter()
        .map(|p| (p.latitude.to_bits(), p.longitude.to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Remove consecutive repeated coordinates, keeping the first of each run.
pub fn dedup_consecutive(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        let repeated = out.last().is_some_and(|last| {
            (last.x - c.x).abs() <= RING_CLOSURE_TOLERANCE_DEG
                && (last.y - c.y).abs() <= RING_CLOSURE_TOLERANCE_DEG
        });
        if !repeated {
            out.push(*c);
        }
    }
    out
}

/// Check that a closed ring does not touch or cross itself.
///
/// Adjacent segments may only share their common vertex; any other contact
/// (including a collinear back-track) makes the ring non-simple. The ring must
/// already be closed and free of consecutive duplicates.
pub fn ring_is_simple(ring: &LineString<f64>) -> bool {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return false,
            }
        }
    }
    true
}

// =============================================================================
// Unit Tests
// =============================================================================
