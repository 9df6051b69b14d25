//! Point classification: which hotspots fall inside a property boundary.
//!
//! Boundary-inclusion policy: a hotspot lying exactly on the boundary ring counts as
//! **inside**. Near a property line it is safer to over-report a fire than to miss one.
//!
//! Each record's location is validated before anything is classified. A record without
//! a usable latitude/longitude fails the whole call with `MalformedRecord` instead of
//! being skipped, so counts are never silently low.

use geo::Polygon;
use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use crate::boundary::Boundary;
use crate::error::{HotspotError, Result};
use crate::hotspot::HotspotRecord;
use crate::LatLon;

/// A hotspot record with its membership flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHotspot {
    pub record: HotspotRecord,
    pub inside: bool,
}

/// Input table plus one `inside` column, and the number of rows inside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub rows: Vec<ClassifiedHotspot>,
    pub inside_count: usize,
}

impl Classification {
    /// Records flagged inside, in input order.
    pub fn inside_records(&self) -> impl Iterator<Item = &HotspotRecord> {
        self.rows.iter().filter(|r| r.inside).map(|r| &r.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validated location of row `row`.
fn record_location(row: usize, record: &HotspotRecord) -> Result<LatLon> {
    let malformed = |reason: &str| HotspotError::MalformedRecord {
        row,
        reason: reason.to_string(),
    };

    let latitude = record.latitude.ok_or_else(|| malformed("missing latitude"))?;
    let longitude = record.longitude.ok_or_else(|| malformed("missing longitude"))?;
    let location = LatLon::new(latitude, longitude);
    if !location.is_valid() {
        return Err(malformed(&format!(
            "({}, {}) is not a valid WGS84 coordinate",
            latitude, longitude
        )));
    }
    Ok(location)
}

fn record_locations(records: &[HotspotRecord]) -> Result<Vec<LatLon>> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| record_location(row, record))
        .collect()
}

fn build_classification(records: &[HotspotRecord], flags: Vec<bool>) -> Classification {
    let inside_count = flags.iter().filter(|&&f| f).count();
    let rows = records
        .iter()
        .zip(flags)
        .map(|(record, inside)| ClassifiedHotspot {
            record: record.clone(),
            inside,
        })
        .collect();
    Classification { rows, inside_count }
}

/// Flag every record as inside or outside `boundary`.
///
/// Runs a bounding-box reject before the exact polygon test. Idempotent: the same
/// boundary and table always give the same rows and count.
pub fn classify(boundary: &Boundary, records: &[HotspotRecord]) -> Result<Classification> {
    let locations = record_locations(records)?;
    let flags: Vec<bool> = locations.iter().map(|p| boundary.contains(p)).collect();

    let result = build_classification(records, flags);
    debug!(
        "[Classify] {} of {} hotspots inside boundary",
        result.inside_count,
        records.len()
    );
    Ok(result)
}

/// Classify against a raw `geo` polygon (x = longitude, y = latitude).
///
/// Fails with `InvalidGeometry` if the polygon is degenerate.
pub fn classify_polygon(polygon: &Polygon<f64>, records: &[HotspotRecord]) -> Result<Classification> {
    let boundary = Boundary::from_polygon(polygon.clone())?;
    classify(&boundary, records)
}

/// Same as [`classify`], with the containment tests spread over rayon's pool.
#[cfg(feature = "parallel")]
pub fn classify_parallel(boundary: &Boundary, records: &[HotspotRecord]) -> Result<Classification> {
    use rayon::prelude::*;

    let locations = record_locations(records)?;
    let flags: Vec<bool> = locations.par_iter().map(|p| boundary.contains(p)).collect();
    Ok(build_classification(records, flags))
}

// ============================================================================
// Spatial index
// ============================================================================

/// Row position of one hotspot, for R-tree indexing.
#[derive(Debug, Clone)]
struct IndexedHotspot {
    row: usize,
    location: LatLon,
}

impl RTreeObject for IndexedHotspot {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.longitude, self.location.latitude])
    }
}

/// R-tree over one hotspot table, for counting against several boundaries.
///
/// Useful when the user is choosing among ring candidates: each candidate's count is
/// an envelope query plus exact tests on the few rows it returns.
pub struct HotspotIndex {
    tree: RTree<IndexedHotspot>,
}

impl HotspotIndex {
    /// Index `records`. Fails with `MalformedRecord` like [`classify`].
    pub fn build(records: &[HotspotRecord]) -> Result<Self> {
        let items: Vec<IndexedHotspot> = record_locations(records)?
            .into_iter()
            .enumerate()
            .map(|(row, location)| IndexedHotspot { row, location })
            .collect();

        Ok(Self { tree: RTree::bulk_load(items) })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Row numbers of hotspots inside `boundary`, ascending.
    pub fn inside_rows(&self, boundary: &Boundary) -> Vec<usize> {
        let b = boundary.bounds();
        let search_bounds = AABB::from_corners([b.min_lng, b.min_lat], [b.max_lng, b.max_lat]);

        let mut rows: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&search_bounds)
            .filter(|h| boundary.contains(&h.location))
            .map(|h| h.row)
            .collect();
        rows.sort_unstable();
        rows
    }

    pub fn count_inside(&self, boundary: &Boundary) -> usize {
        self.inside_rows(boundary).len()
    }
}
