//! Geometry normalizer: turns raw coordinate lists into validated property boundaries.
//!
//! A [`Boundary`] always holds two views of the same ring:
//! - a `geo::Polygon` in (longitude, latitude) order, explicitly closed, used for containment
//! - the display sequence in (latitude, longitude) order, exactly as the user supplied it
//!
//! Construction rejects anything the classifier could not reason about: fewer than three
//! distinct vertices, non-finite or out-of-range coordinates, zero area, or a ring that
//! crosses itself.

use geo::{Area, Coord, Intersects, LineString, Point, Polygon};
use log::debug;
use serde_json::Value;

use crate::error::{invalid_geometry, malformed_input, Result};
use crate::geo_utils::{self, dedup_consecutive, ring_is_simple};
use crate::{Bounds, LatLon};

/// A validated, closed property boundary.
#[derive(Debug, Clone)]
pub struct Boundary {
    polygon: Polygon<f64>,
    display: Vec<LatLon>,
    bounds: Bounds,
    area: f64,
}

impl Boundary {
    /// Build a boundary from (latitude, longitude) points.
    ///
    /// The display sequence is kept verbatim; the internal ring is de-duplicated and
    /// closed. Fails with `InvalidGeometry` if the ring is degenerate.
    pub fn from_lat_lon(points: Vec<LatLon>) -> Result<Self> {
        if points.is_empty() {
            return Err(invalid_geometry("polygon has no vertices"));
        }
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(invalid_geometry(format!(
                "vertex {} ({}, {}) is not a valid WGS84 coordinate",
                i, p.latitude, p.longitude
            )));
        }

        let coords: Vec<Coord<f64>> = points.iter().map(LatLon::to_coord).collect();
        let exterior = closed_ring(&coords)?;
        let polygon = Polygon::new(exterior, vec![]);
        let area = polygon.unsigned_area();
        if area <= 0.0 {
            return Err(invalid_geometry("polygon encloses zero area"));
        }

        let bounds = geo_utils::compute_bounds(&points)
            .ok_or_else(|| invalid_geometry("polygon has no vertices"))?;

        Ok(Self { polygon, display: points, bounds, area })
    }

    /// Adopt an existing `geo` polygon (x = longitude, y = latitude).
    ///
    /// The display sequence is derived from the exterior ring. Interior rings are kept
    /// and respected by [`Boundary::contains`].
    pub fn from_polygon(polygon: Polygon<f64>) -> Result<Self> {
        let (exterior, interiors) = polygon.into_inner();
        let display: Vec<LatLon> = exterior.0.iter().map(|c| LatLon::from_coord(*c)).collect();

        let mut boundary = Self::from_lat_lon(display)?;
        if !interiors.is_empty() {
            let exterior = boundary.polygon.exterior().clone();
            boundary.polygon = Polygon::new(exterior, interiors);
            boundary.area = boundary.polygon.unsigned_area();
            if boundary.area <= 0.0 {
                return Err(invalid_geometry("interior rings cover the whole polygon"));
            }
        }
        Ok(boundary)
    }

    /// Geometry in (longitude, latitude) order.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Vertices in (latitude, longitude) order, as supplied.
    pub fn display_coords(&self) -> &[LatLon] {
        &self.display
    }

    /// Enclosed area in squared degrees.
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Map center: mean of the display vertices.
    pub fn center(&self) -> LatLon {
        geo_utils::compute_center(&self.display)
    }

    /// Containment test. Points on the boundary count as inside.
    pub fn contains(&self, point: &LatLon) -> bool {
        self.bounds.contains(point.latitude, point.longitude)
            && self
                .polygon
                .intersects(&Point::new(point.longitude, point.latitude))
    }
}

/// Validate a raw ring and return it explicitly closed.
fn closed_ring(coords: &[Coord<f64>]) -> Result<LineString<f64>> {
    let mut ring = dedup_consecutive(coords);
    if ring.len() > 1 {
        let (first, last) = (ring[0], ring[ring.len() - 1]);
        let closes = (first.x - last.x).abs() <= geo_utils::RING_CLOSURE_TOLERANCE_DEG
            && (first.y - last.y).abs() <= geo_utils::RING_CLOSURE_TOLERANCE_DEG;
        if closes {
            ring.pop();
        }
    }

    let distinct: Vec<LatLon> = ring.iter().map(|c| LatLon::from_coord(*c)).collect();
    let distinct = geo_utils::distinct_count(&distinct);
    if distinct < 3 {
        return Err(invalid_geometry(format!(
            "polygon needs at least 3 distinct vertices, got {}",
            distinct
        )));
    }

    ring.push(ring[0]);
    let ring = LineString::new(ring);
    if !ring_is_simple(&ring) {
        return Err(invalid_geometry("polygon ring intersects itself"));
    }
    Ok(ring)
}

/// Parse manual input text: a JSON array of `[lat, lon]` numeric pairs.
///
/// Errors name the offending element so the user can fix the input.
///
/// ```rust
/// use hotspot_matcher::parse_manual_coordinates;
///
/// let pts = parse_manual_coordinates("[[-16.4, -58.5], [-16.4, -52.1], [-23.6, -52.1]]").unwrap();
/// assert_eq!(pts.len(), 3);
/// assert_eq!(pts[0].latitude, -16.4);
///
/// assert!(parse_manual_coordinates("[[-16.4]]").is_err());
/// ```
pub fn parse_manual_coordinates(text: &str) -> Result<Vec<LatLon>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| malformed_input(format!("not valid JSON: {}", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| malformed_input("expected a JSON array of [lat, lon] pairs"))?;

    if items.is_empty() {
        return Err(malformed_input("coordinate list is empty"));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let pair = item
                .as_array()
                .filter(|a| a.len() == 2)
                .ok_or_else(|| malformed_input(format!("element {} is not a [lat, lon] pair: {}", i, item)))?;

            let lat = pair[0]
                .as_f64()
                .ok_or_else(|| malformed_input(format!("element {}: latitude {} is not a number", i, pair[0])))?;
            let lon = pair[1]
                .as_f64()
                .ok_or_else(|| malformed_input(format!("element {}: longitude {} is not a number", i, pair[1])))?;

            let point = LatLon::new(lat, lon);
            if !point.is_valid() {
                return Err(malformed_input(format!(
                    "element {}: ({}, {}) is outside latitude [-90, 90] / longitude [-180, 180]",
                    i, lat, lon
                )));
            }
            Ok(point)
        })
        .collect()
}

/// Parse manual input text and build a [`Boundary`] from it.
pub fn normalize_manual(text: &str) -> Result<Boundary> {
    let points = parse_manual_coordinates(text)?;
    debug!("[Boundary] Manual input parsed into {} vertices", points.len());
    Boundary::from_lat_lon(points)
}
