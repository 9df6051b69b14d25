//! View models handed to the map/chart renderer.
//!
//! The crate never draws anything. These structs carry everything a renderer needs
//! (page chrome, map framing, polygon, markers, heat layer, metric cards) and
//! serialize to JSON for whatever front end consumes them.

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::error::Result;
use crate::geo_utils::compute_center;
use crate::heatmap::HeatmapResult;
use crate::metrics::MetricsSummary;
use crate::selector::ResolvedBoundary;
use crate::LatLon;

/// Zoom level for a single property.
pub const PROPERTY_ZOOM: u8 = 10;
/// Zoom level for the national overview.
pub const NATIONAL_ZOOM: u8 = 4;
/// Fixed centre of the national overview, `[lat, lon]`.
pub const NATIONAL_CENTER: [f64; 2] = [-10.91, -51.0641];

/// Page chrome shared by every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub sidebar_title: String,
    /// Markdown shown under the sidebar title
    pub sidebar_markdown: String,
    pub logo_url: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Wildfire Risk on Rural Properties".to_string(),
            sidebar_title: "About us".to_string(),
            sidebar_markdown: "Pantanal data project.".to_string(),
            logo_url: "https://www.ufms.br/wp-content/uploads/2015/11/ufms_logo_assinatura_vertical_positiva.png"
                .to_string(),
        }
    }
}

/// One hotspot circle on the property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotMarker {
    pub lat: f64,
    pub lon: f64,
    pub inside: bool,
    pub popup: String,
}

/// Property page: boundary polygon, every hotspot of the day, and the inside count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapView {
    pub page: PageConfig,
    /// Vertex mean of the display ring, `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
    /// Ring in `[lat, lon]` order, exactly as supplied
    pub polygon: Vec<[f64; 2]>,
    pub markers: Vec<HotspotMarker>,
    pub inside_count: usize,
    pub boundary_label: String,
}

impl PropertyMapView {
    pub fn build(page: &PageConfig, boundary: &ResolvedBoundary, classification: &Classification) -> Self {
        let display: &[LatLon] = boundary.display_coords();
        let markers = classification
            .rows
            .iter()
            .filter_map(|row| {
                let location = row.record.location()?;
                Some(HotspotMarker {
                    lat: location.latitude,
                    lon: location.longitude,
                    inside: row.inside,
                    popup: row.record.popup_text(),
                })
            })
            .collect();

        Self {
            page: page.clone(),
            center: compute_center(display).to_array(),
            zoom: PROPERTY_ZOOM,
            polygon: display.iter().map(LatLon::to_array).collect(),
            markers,
            inside_count: classification.inside_count,
            boundary_label: boundary.label().to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// National page: heat layer at a fixed framing plus metric cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalOverviewView {
    pub page: PageConfig,
    pub center: [f64; 2],
    pub zoom: u8,
    pub heatmap: HeatmapResult,
    pub metrics: MetricsSummary,
}

impl NationalOverviewView {
    pub fn build(page: &PageConfig, heatmap: HeatmapResult, metrics: MetricsSummary) -> Self {
        Self {
            page: page.clone(),
            center: NATIONAL_CENTER,
            zoom: NATIONAL_ZOOM,
            heatmap,
            metrics,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
