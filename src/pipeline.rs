//! One full recomputation pass, top to bottom.
//!
//! Property pass: boundary → fetch → annotate → classify → view model.
//! National pass: fetch → annotate → heatmap + metrics → view model.
//!
//! A boundary error ends the property pass before anything is fetched. An empty fetch
//! never does: the pass completes with zero hotspots and the reason is kept in
//! [`PassOutcome::empty_reason`].

use std::time::Instant;

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::classify::{classify, Classification};
use crate::error::Result;
use crate::heatmap::{generate_heatmap, HeatmapConfig};
use crate::hotspot::{annotate, HotspotRecord};
use crate::metrics::{summarize, HotspotMetric};
use crate::render::{NationalOverviewView, PageConfig, PropertyMapView};
use crate::selector::{BoundarySelector, BoundarySource, CandidateSelection, ResolvedBoundary};
use crate::source::{EmptyReason, FetchConfig, FetchOutcome, HotspotSource};

/// Everything a pass can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub heatmap: HeatmapConfig,
    pub page: PageConfig,
}

impl PipelineConfig {
    /// Load from JSON. Missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of one property pass.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub date: NaiveDate,
    pub boundary: ResolvedBoundary,
    pub classification: Classification,
    pub view: PropertyMapView,
    /// Set when the fetch produced no rows
    pub empty_reason: Option<EmptyReason>,
}

impl PassOutcome {
    pub fn inside_count(&self) -> usize {
        self.classification.inside_count
    }
}

fn fetch_annotated(source: &dyn HotspotSource, date: NaiveDate) -> (Vec<HotspotRecord>, Option<EmptyReason>) {
    match source.fetch_daily(date) {
        FetchOutcome::Loaded(mut records) => {
            annotate(&mut records);
            (records, None)
        }
        FetchOutcome::Empty(reason) => {
            info!("[Pipeline] No hotspots for {}: {}", date, reason);
            (Vec::new(), Some(reason))
        }
    }
}

/// Run the property page for `date`.
pub fn run_property_pass(
    date: NaiveDate,
    boundary_source: BoundarySource,
    selection: &CandidateSelection,
    source: &dyn HotspotSource,
    config: &PipelineConfig,
) -> Result<PassOutcome> {
    let start = Instant::now();

    let mut selector = BoundarySelector::new();
    let boundary = selector.submit(boundary_source, selection)?.clone();

    let (records, empty_reason) = fetch_annotated(source, date);
    let classification = classify(&boundary.boundary, &records)?;
    let view = PropertyMapView::build(&config.page, &boundary, &classification);

    info!(
        "[Pipeline] Property pass {} boundary={:?} hotspots={} inside={} in {:?}",
        date,
        boundary.label(),
        records.len(),
        classification.inside_count,
        start.elapsed()
    );

    Ok(PassOutcome {
        date,
        boundary,
        classification,
        view,
        empty_reason,
    })
}

/// Run the national overview for `date`. `metric` overrides the configured one.
pub fn run_national_pass(
    date: NaiveDate,
    metric: HotspotMetric,
    source: &dyn HotspotSource,
    config: &PipelineConfig,
) -> NationalOverviewView {
    let start = Instant::now();

    let (records, _) = fetch_annotated(source, date);
    let heatmap_config = HeatmapConfig {
        metric,
        ..config.heatmap.clone()
    };
    let heatmap = generate_heatmap(&records, &heatmap_config);
    let metrics = summarize(&records, metric);

    info!(
        "[Pipeline] National pass {} metric={} hotspots={} cells={} in {:?}",
        date,
        metric,
        metrics.total,
        heatmap.cells.len(),
        start.elapsed()
    );

    NationalOverviewView::build(&config.page, heatmap, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HotspotError;
    use crate::source::StaticSource;
    use std::cell::Cell;

    const RECTANGLE: &str =
        "[[-16.40,-58.50],[-16.40,-52.10],[-23.60,-52.10],[-23.60,-58.50],[-16.40,-58.50]]";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    /// Source that records whether it was asked for data.
    struct CountingSource {
        calls: Cell<usize>,
    }

    impl HotspotSource for CountingSource {
        fn fetch_daily(&self, _date: NaiveDate) -> FetchOutcome {
            self.calls.set(self.calls.get() + 1);
            FetchOutcome::Empty(EmptyReason::HttpStatus(404))
        }
    }

    #[test]
    fn test_property_pass_counts_inside() {
        let source = StaticSource::new(vec![HotspotRecord::at(-20.0, -55.0), HotspotRecord::at(0.0, 0.0)]);
        let outcome = run_property_pass(
            date(),
            BoundarySource::Manual(RECTANGLE.to_string()),
            &CandidateSelection::Largest,
            &source,
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.inside_count(), 1);
        assert_eq!(outcome.view.markers.len(), 2);
        assert!(outcome.empty_reason.is_none());
    }

    #[test]
    fn test_empty_fetch_is_not_an_error() {
        let source = CountingSource { calls: Cell::new(0) };
        let outcome = run_property_pass(
            date(),
            BoundarySource::Manual(RECTANGLE.to_string()),
            &CandidateSelection::Largest,
            &source,
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.inside_count(), 0);
        assert_eq!(outcome.empty_reason, Some(EmptyReason::HttpStatus(404)));
        assert_eq!(outcome.view.polygon.len(), 5);
    }

    #[test]
    fn test_boundary_error_skips_fetch() {
        let source = CountingSource { calls: Cell::new(0) };
        let err = run_property_pass(
            date(),
            BoundarySource::Manual("[[0,0],[1,1]]".to_string()),
            &CandidateSelection::Largest,
            &source,
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HotspotError::InvalidGeometry(_)));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_national_pass() {
        let mut hotspot = HotspotRecord::at(-19.0, -57.0);
        hotspot.frp = Some(12.5);
        hotspot.municipality = "CORUMBÁ".to_string();
        hotspot.state = "MATO GROSSO DO SUL".to_string();
        hotspot.biome = "Pantanal".to_string();
        let source = StaticSource::new(vec![hotspot]);

        let view = run_national_pass(date(), HotspotMetric::Frp, &source, &PipelineConfig::default());
        assert_eq!(view.metrics.total, 1);
        assert_eq!(view.metrics.top_municipality_by_metric.unwrap().label, "Corumbá-MS");
        assert_eq!(view.heatmap.cells.len(), 1);
        assert_eq!(view.heatmap.radius, 10);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            PipelineConfig::from_json_str(r#"{"heatmap": {"radius": 20}, "fetch": {"timeout_secs": 5}}"#)
                .unwrap();
        assert_eq!(config.heatmap.radius, 20);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.page, PageConfig::default());
        assert!(PipelineConfig::from_json_str("not json").is_err());
    }
}
