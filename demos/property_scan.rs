//! Classify a small hotspot table against a manual property boundary.
//!
//! Run with: cargo run --example property_scan

use chrono::NaiveDate;
use hotspot_matcher::{
    run_property_pass, BoundarySource, CandidateSelection, HotspotIndex, PipelineConfig,
    StaticSource,
};

const PROPERTY: &str =
    "[[-16.40,-58.50],[-16.40,-52.10],[-23.60,-52.10],[-23.60,-58.50],[-16.40,-58.50]]";

const DAILY_CSV: &str = "\
lat,lon,data_hora_gmt,satelite,municipio,estado,pais,numero_dias_sem_chuva,precipitacao,risco_fogo,bioma,frp
-19.0092,-57.6533,2024-08-01 17:20:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,12,0.0,1.0,Pantanal,35.2
-16.4000,-55.0000,2024-08-01 17:22:00,AQUA_M-T,RONDONÓPOLIS,MATO GROSSO,Brasil,9,0.0,0.8,Cerrado,4.1
-3.1000,-60.0000,2024-08-01 04:10:00,NOAA-20,MANAUS,AMAZONAS,Brasil,3,2.1,0.4,Amazônia,80.0
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let date = NaiveDate::from_ymd_opt(2024, 8, 1).ok_or("invalid date")?;
    let source = StaticSource::from_csv(DAILY_CSV);
    let config = PipelineConfig::default();

    println!("Property Scan\n");

    let outcome = run_property_pass(
        date,
        BoundarySource::Manual(PROPERTY.to_string()),
        &CandidateSelection::Largest,
        &source,
        &config,
    )?;

    println!("Boundary: {} vertices, area {:.2} deg²", outcome.boundary.display_coords().len(), outcome.boundary.boundary.area());
    println!("Map center: {:?} (zoom {})\n", outcome.view.center, outcome.view.zoom);

    for row in &outcome.classification.rows {
        println!(
            "  {:>9.4}, {:>9.4}  {:<8} {}",
            row.record.latitude.unwrap_or_default(),
            row.record.longitude.unwrap_or_default(),
            if row.inside { "inside" } else { "outside" },
            row.record.municipality_label.as_deref().unwrap_or("-"),
        );
    }
    println!("\nHotspots detected in the area: {}", outcome.inside_count());

    // Same count through the spatial index
    let records: Vec<_> = outcome.classification.rows.iter().map(|r| r.record.clone()).collect();
    let index = HotspotIndex::build(&records)?;
    println!("Index count: {}", index.count_inside(&outcome.boundary.boundary));

    println!("\nView model:\n{}", outcome.view.to_json()?);
    Ok(())
}
