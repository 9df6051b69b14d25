//! End-to-end scenarios: boundary input through classification and view models.

use chrono::NaiveDate;
use hotspot_matcher::{
    extract_ring_candidates, run_national_pass, run_property_pass, BoundaryOrigin, BoundarySource,
    CandidateSelection, EmptyReason, FetchOutcome, HotspotError, HotspotMetric, HotspotSource,
    PipelineConfig, StaticSource, UNNAMED_TRACK_LABEL,
};

const RECTANGLE: &str =
    "[[-16.40,-58.50],[-16.40,-52.10],[-23.60,-52.10],[-23.60,-58.50],[-16.40,-58.50]]";

const DAILY_CSV: &str = "\
id,lat,lon,data_hora_gmt,satelite,municipio,estado,pais,municipio_id,estado_id,pais_id,numero_dias_sem_chuva,precipitacao,risco_fogo,bioma,frp
1,-19.0092,-57.6533,2024-08-01 17:20:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,5003207,50,33,12,0.0,1.0,Pantanal,35.2
2,-19.0100,-57.6500,2024-08-01 17:21:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,5003207,50,33,14,0.0,0.9,Pantanal,12.0
3,-3.1000,-60.0000,2024-08-01 04:10:00,NOAA-20,MANAUS,AMAZONAS,Brasil,1302603,13,33,3,2.1,0.4,Amazônia,80.0
4,-10.2000,-48.3000,2024-08-01 04:12:00,NOAA-20,PALMAS,TOCANTINS,Brasil,1721000,17,33,30,0.0,1.0,Cerrado,
";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
}

struct FailingSource;

impl HotspotSource for FailingSource {
    fn fetch_daily(&self, _date: NaiveDate) -> FetchOutcome {
        FetchOutcome::Empty(EmptyReason::Transport("connection refused".to_string()))
    }
}

fn kml(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>{}</Document></kml>"#,
        body
    )
    .into_bytes()
}

fn line_placemark(name: Option<&str>, coords: &str) -> String {
    let name = name.map(|n| format!("<name>{}</name>", n)).unwrap_or_default();
    format!(
        "<Placemark>{}<LineString><coordinates>{}</coordinates></LineString></Placemark>",
        name, coords
    )
}

#[test]
fn manual_rectangle_counts_pantanal_hotspots() {
    init();
    let source = StaticSource::from_csv(DAILY_CSV);
    let outcome = run_property_pass(
        date(),
        BoundarySource::Manual(RECTANGLE.to_string()),
        &CandidateSelection::Largest,
        &source,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.boundary.origin, BoundaryOrigin::Manual);
    assert_eq!(outcome.inside_count(), 2);
    assert_eq!(outcome.classification.len(), 4);
    assert_eq!(outcome.view.markers.len(), 4);

    let labels: Vec<_> = outcome
        .classification
        .inside_records()
        .map(|r| r.municipality_label.clone())
        .collect();
    assert_eq!(labels, vec![Some("Corumbá-MS".to_string()), Some("Corumbá-MS".to_string())]);
}

#[test]
fn unreachable_source_renders_empty_map() {
    init();
    let outcome = run_property_pass(
        date(),
        BoundarySource::Manual(RECTANGLE.to_string()),
        &CandidateSelection::Largest,
        &FailingSource,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.inside_count(), 0);
    assert!(outcome.view.markers.is_empty());
    assert_eq!(outcome.view.polygon.len(), 5);
    assert!(matches!(outcome.empty_reason, Some(EmptyReason::Transport(_))));
}

#[test]
fn track_file_rings_rank_by_area() {
    init();
    // areas 10 and 50 square degrees, smaller one first in the document
    let body = format!(
        "<Folder>{}</Folder>{}",
        line_placemark(Some("pasture"), "0,0 5,0 5,2 0,2 0,0"),
        line_placemark(None, "0,0 10,0 10,5 0,5 0,0"),
    );
    let candidates = extract_ring_candidates(&kml(&body)).unwrap();

    let areas: Vec<f64> = candidates.iter().map(|c| c.area).collect();
    assert_eq!(areas.len(), 2);
    assert!((areas[0] - 50.0).abs() < 1e-9);
    assert!((areas[1] - 10.0).abs() < 1e-9);
    assert_eq!(candidates[0].label, UNNAMED_TRACK_LABEL);
    assert_eq!(candidates[1].label, "pasture");
}

#[test]
fn track_file_pass_with_selected_candidate() {
    init();
    let body = format!(
        "{}{}",
        line_placemark(Some("whole farm"), "-58.5,-16.4 -52.1,-16.4 -52.1,-23.6 -58.5,-23.6 -58.5,-16.4"),
        line_placemark(Some("north paddock"), "-56,-20 -55,-20 -55,-21 -56,-21 -56,-20"),
    );
    let source = StaticSource::from_csv(DAILY_CSV);

    let largest = run_property_pass(
        date(),
        BoundarySource::TrackFile(kml(&body)),
        &CandidateSelection::Largest,
        &source,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(largest.boundary.label(), "whole farm");
    assert_eq!(largest.inside_count(), 2);

    let paddock = run_property_pass(
        date(),
        BoundarySource::TrackFile(kml(&body)),
        &CandidateSelection::Label("north paddock".to_string()),
        &source,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(paddock.boundary.origin, BoundaryOrigin::TrackFile);
    assert_eq!(paddock.boundary.candidates.len(), 2);
    assert_eq!(paddock.inside_count(), 0);
}

#[test]
fn track_file_without_rings_is_rejected() {
    init();
    let open_only = kml(&line_placemark(Some("road"), "0,0 1,0 1,1"));
    let err = run_property_pass(
        date(),
        BoundarySource::TrackFile(open_only),
        &CandidateSelection::Largest,
        &FailingSource,
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HotspotError::NoClosedRing { tracks: 1 }));

    let empty = kml("");
    assert!(matches!(
        extract_ring_candidates(&empty),
        Err(HotspotError::NoTracksFound)
    ));
}

#[test]
fn malformed_manual_input_names_the_element() {
    init();
    let err = run_property_pass(
        date(),
        BoundarySource::Manual("[[0,0],[0,1],[\"a\",1]]".to_string()),
        &CandidateSelection::Largest,
        &FailingSource,
        &PipelineConfig::default(),
    )
    .unwrap_err();
    match err {
        HotspotError::MalformedInput(msg) => assert!(msg.contains("element 2"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn national_overview_metrics() {
    init();
    let source = StaticSource::from_csv(DAILY_CSV);
    let config = PipelineConfig::from_json_str(r#"{"heatmap": {"radius": 25}}"#).unwrap();

    let frp = run_national_pass(date(), HotspotMetric::Frp, &source, &config);
    // Palmas has no FRP value
    assert_eq!(frp.metrics.total, 3);
    assert_eq!(frp.metrics.top_municipality_by_count.as_ref().unwrap().label, "Corumbá-MS");
    assert_eq!(frp.metrics.top_biome_by_metric.as_ref().unwrap().label, "Amazônia");
    assert_eq!(frp.heatmap.radius, 25);
    assert_eq!(frp.heatmap.total_hotspots, 3);
    assert_eq!(frp.center, [-10.91, -51.0641]);

    let rain = run_national_pass(date(), HotspotMetric::DaysWithoutRain, &source, &config);
    assert_eq!(rain.metrics.total, 4);
    let top = rain.metrics.top_municipality_by_metric.unwrap();
    assert_eq!(top.label, "Palmas-TO");
    assert_eq!(top.value, 30.0);
}
