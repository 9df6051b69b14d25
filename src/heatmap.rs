//! Heatmap generation for the national overview.
//!
//! Creates a sparse grid of cells from a day of hotspots, tracking:
//! - Summed metric value per cell (the heat weight)
//! - Hotspot count per cell
//! - Normalized density for color mapping
//!
//! The aggregation radius is not applied here. It is validated, clamped and passed
//! through to the renderer, which blurs each weighted point by that many pixels.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::METERS_PER_DEGREE;
use crate::hotspot::HotspotRecord;
use crate::metrics::HotspotMetric;

/// Smallest aggregation radius accepted, in pixels.
pub const MIN_RADIUS: u32 = 5;
/// Largest aggregation radius accepted, in pixels.
pub const MAX_RADIUS: u32 = 50;

/// Configuration for heatmap generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Grid cell size in meters (default: 10km)
    pub cell_size_meters: f64,
    /// Renderer aggregation radius in pixels, clamped to 5..=50 (default: 10)
    pub radius: u32,
    /// Column used as the heat weight (default: FRP)
    pub metric: HotspotMetric,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cell_size_meters: 10_000.0,
            radius: 10,
            metric: HotspotMetric::Frp,
        }
    }
}

impl HeatmapConfig {
    /// Radius clamped to the accepted range.
    pub fn effective_radius(&self) -> u32 {
        self.radius.clamp(MIN_RADIUS, MAX_RADIUS)
    }

    /// Cell size, or the 10 km default when the configured one is zero, negative or not finite.
    pub fn effective_cell_size(&self) -> f64 {
        if self.cell_size_meters.is_finite() && self.cell_size_meters > 0.0 {
            self.cell_size_meters
        } else {
            Self::default().cell_size_meters
        }
    }
}

/// Bounding box of the hotspots that made it into the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// A single cell in the heatmap grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// Grid row index
    pub row: i32,
    /// Grid column index
    pub col: i32,
    /// Cell center for rendering
    pub center_lat: f64,
    pub center_lng: f64,
    /// Sum of the metric over hotspots in this cell
    pub weight: f64,
    pub hotspot_count: u32,
    /// Normalized weight (0.0-1.0) for color mapping
    pub density: f32,
}

/// Complete heatmap result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapResult {
    /// Non-empty cells only (sparse representation), sorted by (row, col)
    pub cells: Vec<HeatmapCell>,
    /// Computed bounds from data
    pub bounds: HeatmapBounds,
    /// Cell size used
    pub cell_size_meters: f64,
    /// Latitude the longitude scale was taken at
    pub ref_lat: f64,
    /// Grid dimensions
    pub grid_rows: u32,
    pub grid_cols: u32,
    /// Largest cell weight, the normalization divisor
    pub max_weight: f64,
    /// Renderer aggregation radius, already clamped
    pub radius: u32,
    pub metric: HotspotMetric,
    /// Hotspots that contributed a weight
    pub total_hotspots: u32,
}

impl HeatmapResult {
    /// `[lat, lng, weight]` triples at cell centers, the layout heat layers take.
    pub fn weighted_points(&self) -> Vec<[f64; 3]> {
        self.cells
            .iter()
            .map(|c| [c.center_lat, c.center_lng, c.weight])
            .collect()
    }

    /// The cell containing `(lat, lng)`, if it holds any hotspots.
    pub fn cell_at(&self, lat: f64, lng: f64) -> Option<&HeatmapCell> {
        let (row, col) = grid_coords(self.ref_lat, self.cell_size_meters, lat, lng);
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

// Internal cell data during construction
#[derive(Debug, Default)]
struct CellBuilder {
    weight: f64,
    hotspot_count: u32,
}

/// Grid coordinate
type CellCoord = (i32, i32);

fn lng_meters_per_deg(ref_lat: f64) -> f64 {
    METERS_PER_DEGREE * ref_lat.to_radians().cos()
}

fn grid_coords(ref_lat: f64, cell_size_meters: f64, lat: f64, lng: f64) -> CellCoord {
    let row = ((lat - ref_lat) * METERS_PER_DEGREE / cell_size_meters).floor() as i32;
    let col = (lng * lng_meters_per_deg(ref_lat) / cell_size_meters).floor() as i32;
    (row, col)
}

/// Heatmap grid builder
struct HeatmapGrid {
    cell_size_meters: f64,
    ref_lat: f64,
    cells: HashMap<CellCoord, CellBuilder>,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
    total_hotspots: u32,
}

impl HeatmapGrid {
    fn new(cell_size_meters: f64, ref_lat: f64) -> Self {
        Self {
            cell_size_meters,
            ref_lat,
            cells: HashMap::new(),
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            total_hotspots: 0,
        }
    }

    /// Get cell center coordinates
    fn cell_center(&self, row: i32, col: i32) -> (f64, f64) {
        let center_lat =
            self.ref_lat + ((row as f64 + 0.5) * self.cell_size_meters / METERS_PER_DEGREE);
        let center_lng = (col as f64 + 0.5) * self.cell_size_meters / lng_meters_per_deg(self.ref_lat);
        (center_lat, center_lng)
    }

    /// Add a weighted point to the grid
    fn add_point(&mut self, lat: f64, lng: f64, weight: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lng = self.min_lng.min(lng);
        self.max_lng = self.max_lng.max(lng);

        let key = grid_coords(self.ref_lat, self.cell_size_meters, lat, lng);
        let cell = self.cells.entry(key).or_default();
        cell.weight += weight;
        cell.hotspot_count += 1;
        self.total_hotspots += 1;
    }

    /// Build the final heatmap result
    fn build(self, config: &HeatmapConfig) -> HeatmapResult {
        if self.cells.is_empty() {
            return HeatmapResult {
                cells: vec![],
                bounds: HeatmapBounds {
                    min_lat: 0.0,
                    max_lat: 0.0,
                    min_lng: 0.0,
                    max_lng: 0.0,
                },
                cell_size_meters: self.cell_size_meters,
                ref_lat: self.ref_lat,
                grid_rows: 0,
                grid_cols: 0,
                max_weight: 0.0,
                radius: config.effective_radius(),
                metric: config.metric,
                total_hotspots: 0,
            };
        }

        let max_weight = self.cells.values().map(|c| c.weight).fold(0.0_f64, f64::max);

        let mut cells: Vec<HeatmapCell> = self
            .cells
            .iter()
            .map(|(&(row, col), builder)| {
                let (center_lat, center_lng) = self.cell_center(row, col);
                let density = if max_weight > 0.0 {
                    (builder.weight / max_weight) as f32
                } else {
                    0.0
                };
                HeatmapCell {
                    row,
                    col,
                    center_lat,
                    center_lng,
                    weight: builder.weight,
                    hotspot_count: builder.hotspot_count,
                    density,
                }
            })
            .collect();
        cells.sort_by_key(|c| (c.row, c.col));

        // Calculate grid dimensions
        let min_row = self.cells.keys().map(|(r, _)| *r).min().unwrap_or(0);
        let max_row = self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0);
        let min_col = self.cells.keys().map(|(_, c)| *c).min().unwrap_or(0);
        let max_col = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);

        HeatmapResult {
            cells,
            bounds: HeatmapBounds {
                min_lat: self.min_lat,
                max_lat: self.max_lat,
                min_lng: self.min_lng,
                max_lng: self.max_lng,
            },
            cell_size_meters: self.cell_size_meters,
            ref_lat: self.ref_lat,
            grid_rows: (max_row as i64 - min_row as i64 + 1) as u32,
            grid_cols: (max_col as i64 - min_col as i64 + 1) as u32,
            max_weight,
            radius: config.effective_radius(),
            metric: config.metric,
            total_hotspots: self.total_hotspots,
        }
    }
}

/// Generate a heatmap from a hotspot table.
///
/// Hotspots without a location or without a value for the configured metric are
/// skipped. The longitude scale is taken at the latitude of the first usable hotspot.
pub fn generate_heatmap(records: &[HotspotRecord], config: &HeatmapConfig) -> HeatmapResult {
    let points: Vec<(f64, f64, f64)> = records
        .iter()
        .filter_map(|r| {
            let location = r.location().filter(|l| l.is_valid())?;
            let weight = config.metric.value(r)?;
            Some((location.latitude, location.longitude, weight))
        })
        .collect();

    let ref_lat = points.first().map(|p| p.0).unwrap_or(0.0);
    let mut grid = HeatmapGrid::new(config.effective_cell_size(), ref_lat);
    for &(lat, lng, weight) in &points {
        grid.add_point(lat, lng, weight);
    }

    let result = grid.build(config);
    debug!(
        "[Heatmap] {} of {} hotspots -> {} cells ({})",
        result.total_hotspots,
        records.len(),
        result.cells.len(),
        config.metric
    );
    result
}
