//! Fetch one day of hotspots from the national product and classify them.
//!
//! Run with: cargo run --example daily_fetch --features http -- 2024-08-01

use chrono::{Duration, NaiveDate, Utc};
use hotspot_matcher::{
    run_property_pass, BoundarySource, CandidateSelection, HttpHotspotSource, PipelineConfig,
};

const PROPERTY: &str =
    "[[-16.40,-58.50],[-16.40,-52.10],[-23.60,-52.10],[-23.60,-58.50],[-16.40,-58.50]]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Default to yesterday, the latest complete daily file
    let date = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")?,
        None => Utc::now().date_naive() - Duration::days(1),
    };

    let config = PipelineConfig::default();
    println!("Fetching {}", config.fetch.url_for_date(date));

    let source = HttpHotspotSource::new(config.fetch.clone())?;
    let outcome = run_property_pass(
        date,
        BoundarySource::Manual(PROPERTY.to_string()),
        &CandidateSelection::Largest,
        &source,
        &config,
    )?;

    match &outcome.empty_reason {
        Some(reason) => println!("No hotspots loaded ({})", reason),
        None => println!("Loaded {} hotspots", outcome.classification.len()),
    }
    println!("Hotspots inside the property: {}", outcome.inside_count());
    Ok(())
}
