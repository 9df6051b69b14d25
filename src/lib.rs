//! # Hotspot Matcher
//!
//! Wildfire hotspot classification against rural-property boundaries.
//!
//! This library provides:
//! - Boundary normalization from manual `[lat, lon]` lists or uploaded KML track files
//! - Closed-ring extraction from KML feature trees, ranked by enclosed area
//! - Point-in-polygon classification of daily hotspot tables
//! - National metrics and heatmap aggregation over the same tables
//! - Daily hotspot fetching with fail-soft semantics
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel classification with rayon
//! - **`http`** - Enable HTTP client for daily hotspot fetching
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use hotspot_matcher::{classify, normalize_manual, HotspotRecord};
//!
//! let boundary = normalize_manual(
//!     "[[-16.40,-58.50],[-16.40,-52.10],[-23.60,-52.10],[-23.60,-58.50],[-16.40,-58.50]]",
//! ).unwrap();
//!
//! let records = vec![
//!     HotspotRecord::at(-20.0, -55.0),
//!     HotspotRecord::at(0.0, 0.0),
//! ];
//!
//! let result = classify(&boundary, &records).unwrap();
//! assert_eq!(result.inside_count, 1);
//! assert!(result.rows[0].inside);
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{HotspotError, Result};

pub mod geo_utils;

// Geometry normalizer (manual coordinate lists)
pub mod boundary;
pub use boundary::{normalize_manual, parse_manual_coordinates, Boundary};

// KML ring extraction
pub mod track_file;
pub use track_file::{
    extract_ring_candidates, flatten_tracks, normalize_kml_namespace, parse_feature_tree,
    rings_from_tracks, FeatureNode, RingCandidate, Track, UNNAMED_TRACK_LABEL,
};

// Point classification
pub mod classify;
pub use classify::{classify, classify_polygon, Classification, ClassifiedHotspot, HotspotIndex};
#[cfg(feature = "parallel")]
pub use classify::classify_parallel;

// Manual vs track-file boundary selection
pub mod selector;
pub use selector::{
    BoundaryOrigin, BoundarySelector, BoundarySource, CandidateSelection, CandidateSummary,
    ResolvedBoundary, SelectorState,
};

// Hotspot table: CSV rows and state annotations
pub mod hotspot;
pub use hotspot::{annotate, parse_hotspot_csv, state_code, HotspotRecord};

// Hotspot sources (fail-soft)
pub mod source;
pub use source::{EmptyReason, FetchConfig, FetchOutcome, HotspotSource, StaticSource};

// HTTP module for daily hotspot fetching
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HotspotFetcher, HttpHotspotSource};

// National overview metrics
pub mod metrics;
pub use metrics::{summarize, BiomeCount, HotspotMetric, MetricsSummary, RankedLabel};

// Heatmap generation module
pub mod heatmap;
pub use heatmap::{generate_heatmap, HeatmapBounds, HeatmapCell, HeatmapConfig, HeatmapResult};

// View models for the rendering collaborator
pub mod render;
pub use render::{HotspotMarker, NationalOverviewView, PageConfig, PropertyMapView};

// One full recomputation pass
pub mod pipeline;
pub use pipeline::{run_national_pass, run_property_pass, PassOutcome, PipelineConfig};

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate in display order (latitude, longitude).
///
/// # Example
/// ```
/// use hotspot_matcher::LatLon;
/// let corumba = LatLon::new(-19.0092, -57.6533);
/// assert!(corumba.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the coordinate is finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Convert to a `geo` coordinate (x = longitude, y = latitude).
    pub fn to_coord(&self) -> geo::Coord<f64> {
        geo::Coord { x: self.longitude, y: self.latitude }
    }

    /// Convert from a `geo` coordinate (x = longitude, y = latitude).
    pub fn from_coord(c: geo::Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }

    /// `[lat, lon]` array, the layout map renderers expect.
    pub fn to_array(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from coordinates.
    pub fn from_points(points: &[LatLon]) -> Option<Self> {
        geo_utils::compute_bounds(points)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lng
            && longitude <= self.max_lng
    }
}

// ============================================================================
// Tests
// ============================================================================
