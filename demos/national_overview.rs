//! National heatmap and metric cards for every metric.
//!
//! Run with: cargo run --example national_overview

use chrono::NaiveDate;
use hotspot_matcher::{run_national_pass, HotspotMetric, PipelineConfig, StaticSource};

const DAILY_CSV: &str = "\
lat,lon,data_hora_gmt,satelite,municipio,estado,pais,numero_dias_sem_chuva,precipitacao,risco_fogo,bioma,frp
-19.0092,-57.6533,2024-08-01 17:20:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,12,0.0,1.0,Pantanal,35.2
-19.0100,-57.6500,2024-08-01 17:21:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,14,0.0,0.9,Pantanal,12.0
-3.1000,-60.0000,2024-08-01 04:10:00,NOAA-20,MANAUS,AMAZONAS,Brasil,3,2.1,0.4,Amazônia,80.0
-10.2000,-48.3000,2024-08-01 04:12:00,NOAA-20,PALMAS,TOCANTINS,Brasil,30,0.0,1.0,Cerrado,-999
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let date = NaiveDate::from_ymd_opt(2024, 8, 1).ok_or("invalid date")?;
    let source = StaticSource::from_csv(DAILY_CSV);
    let config = PipelineConfig::from_json_str(r#"{"heatmap": {"radius": 15}}"#)?;

    println!("National Overview {}\n", date);

    for metric in HotspotMetric::ALL {
        let view = run_national_pass(date, metric, &source, &config);
        let m = &view.metrics;

        println!("{} ({})", metric, metric.column());
        println!("  Total hotspots: {}", m.total);
        if let Some(top) = &m.top_municipality_by_count {
            println!("  Municipality with most hotspots: {} ({})", top.label, top.value);
        }
        if let Some(top) = &m.top_municipality_by_metric {
            println!("  Municipality with highest {}: {} ({:.1})", metric.label().to_lowercase(), top.label, top.value);
        }
        if let Some(top) = &m.top_biome_by_count {
            println!("  Biome with most hotspots: {} ({})", top.label, top.value);
        }
        if let Some(top) = &m.top_biome_by_metric {
            println!("  Biome with highest {}: {} ({:.1})", metric.label().to_lowercase(), top.label, top.value);
        }
        for biome in &m.per_biome {
            println!("    {:<12} {}", biome.biome, biome.count);
        }
        println!(
            "  Heatmap: {} cells, radius {}, max weight {:.1}\n",
            view.heatmap.cells.len(),
            view.heatmap.radius,
            view.heatmap.max_weight
        );
    }

    Ok(())
}
