//! National overview metrics.
//!
//! Aggregates a day of hotspots for one selected metric:
//!
//! | Statistic | Grouping | Reduction |
//! |-----------|----------|-----------|
//! | `total` | none | row count |
//! | `top_municipality_by_count` | `Municipality-UF` label | row count |
//! | `top_municipality_by_metric` | `Municipality-UF` label | metric sum |
//! | `top_biome_by_count` | biome | row count |
//! | `top_biome_by_metric` | biome | metric sum |
//! | `per_biome` | biome | row count |
//!
//! Rows where the selected metric is missing are dropped before anything is counted.
//! Rows without a municipality label (unknown state) or without a biome are left out
//! of that grouping only. Ties go to the alphabetically first label.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hotspot::HotspotRecord;

/// Which numeric column drives the heatmap and the "by metric" rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HotspotMetric {
    /// Fire radiative power
    #[default]
    Frp,
    DaysWithoutRain,
    FireRisk,
}

impl HotspotMetric {
    pub const ALL: [HotspotMetric; 3] = [
        HotspotMetric::Frp,
        HotspotMetric::DaysWithoutRain,
        HotspotMetric::FireRisk,
    ];

    /// Value of this metric for `record`, if present.
    pub fn value(&self, record: &HotspotRecord) -> Option<f64> {
        match self {
            HotspotMetric::Frp => record.frp,
            HotspotMetric::DaysWithoutRain => record.days_without_rain,
            HotspotMetric::FireRisk => record.fire_risk,
        }
    }

    /// Source CSV column.
    pub fn column(&self) -> &'static str {
        match self {
            HotspotMetric::Frp => "frp",
            HotspotMetric::DaysWithoutRain => "numero_dias_sem_chuva",
            HotspotMetric::FireRisk => "risco_fogo",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            HotspotMetric::Frp => "Fire intensity",
            HotspotMetric::DaysWithoutRain => "Days without rain",
            HotspotMetric::FireRisk => "Fire risk",
        }
    }
}

impl fmt::Display for HotspotMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A winning group and its value (count or metric sum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeCount {
    pub biome: String,
    pub count: usize,
}

/// Aggregate statistics for one metric over one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub metric: HotspotMetric,
    /// Rows with a value for `metric`
    pub total: usize,
    pub top_municipality_by_count: Option<RankedLabel>,
    pub top_municipality_by_metric: Option<RankedLabel>,
    pub top_biome_by_count: Option<RankedLabel>,
    pub top_biome_by_metric: Option<RankedLabel>,
    /// Sorted by biome name
    pub per_biome: Vec<BiomeCount>,
}

#[derive(Debug, Default)]
struct GroupTotals {
    count: usize,
    sum: f64,
}

fn top_by<F>(groups: &BTreeMap<String, GroupTotals>, key: F) -> Option<RankedLabel>
where
    F: Fn(&GroupTotals) -> f64,
{
    // BTreeMap iterates in label order; strict `>` keeps the first label on ties
    let mut best: Option<(&String, f64)> = None;
    for (label, totals) in groups {
        let value = key(totals);
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((label, value));
        }
    }
    best.map(|(label, value)| RankedLabel {
        label: label.clone(),
        value,
    })
}

/// Aggregate `records` for `metric`.
///
/// Expects records already passed through [`crate::annotate`]; unannotated records
/// simply drop out of the municipality rankings.
pub fn summarize(records: &[HotspotRecord], metric: HotspotMetric) -> MetricsSummary {
    let mut municipalities: BTreeMap<String, GroupTotals> = BTreeMap::new();
    let mut biomes: BTreeMap<String, GroupTotals> = BTreeMap::new();
    let mut total = 0;

    for record in records {
        let Some(value) = metric.value(record) else {
            continue;
        };
        total += 1;

        if let Some(label) = &record.municipality_label {
            let g = municipalities.entry(label.clone()).or_default();
            g.count += 1;
            g.sum += value;
        }

        let biome = record.biome.trim();
        if !biome.is_empty() {
            let g = biomes.entry(biome.to_string()).or_default();
            g.count += 1;
            g.sum += value;
        }
    }

    let per_biome = biomes
        .iter()
        .map(|(biome, g)| BiomeCount {
            biome: biome.clone(),
            count: g.count,
        })
        .collect();

    MetricsSummary {
        metric,
        total,
        top_municipality_by_count: top_by(&municipalities, |g| g.count as f64),
        top_municipality_by_metric: top_by(&municipalities, |g| g.sum),
        top_biome_by_count: top_by(&biomes, |g| g.count as f64),
        top_biome_by_metric: top_by(&biomes, |g| g.sum),
        per_biome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::annotate;

    fn record(municipality: &str, state: &str, biome: &str, frp: Option<f64>) -> HotspotRecord {
        HotspotRecord {
            municipality: municipality.to_string(),
            state: state.to_string(),
            biome: biome.to_string(),
            frp,
            fire_risk: Some(1.0),
            ..HotspotRecord::at(-20.0, -55.0)
        }
    }

    fn sample() -> Vec<HotspotRecord> {
        let mut records = vec![
            record("CORUMBÁ", "MATO GROSSO DO SUL", "Pantanal", Some(10.0)),
            record("CORUMBÁ", "MATO GROSSO DO SUL", "Pantanal", Some(5.0)),
            record("CORUMBÁ", "MATO GROSSO DO SUL", "Pantanal", None),
            record("MANAUS", "AMAZONAS", "Amazônia", Some(100.0)),
            record("POCONÉ", "MATO GROSSO", "Pantanal", Some(1.0)),
        ];
        annotate(&mut records);
        records
    }

    #[test]
    fn test_summary_for_frp() {
        let summary = summarize(&sample(), HotspotMetric::Frp);
        assert_eq!(summary.total, 4);

        let by_count = summary.top_municipality_by_count.unwrap();
        assert_eq!(by_count.label, "Corumbá-MS");
        assert_eq!(by_count.value, 2.0);

        let by_metric = summary.top_municipality_by_metric.unwrap();
        assert_eq!(by_metric.label, "Manaus-AM");
        assert_eq!(by_metric.value, 100.0);

        assert_eq!(summary.top_biome_by_count.unwrap().label, "Pantanal");
        assert_eq!(summary.top_biome_by_metric.unwrap().label, "Amazônia");

        assert_eq!(
            summary.per_biome,
            vec![
                BiomeCount { biome: "Amazônia".to_string(), count: 1 },
                BiomeCount { biome: "Pantanal".to_string(), count: 3 },
            ]
        );
    }

    #[test]
    fn test_missing_metric_rows_are_dropped() {
        // fire_risk is set on every row, so nothing is dropped
        let summary = summarize(&sample(), HotspotMetric::FireRisk);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.top_municipality_by_count.unwrap().value, 3.0);

        // days_without_rain is set on none
        let summary = summarize(&sample(), HotspotMetric::DaysWithoutRain);
        assert_eq!(summary.total, 0);
        assert!(summary.top_biome_by_count.is_none());
        assert!(summary.per_biome.is_empty());
    }

    #[test]
    fn test_ties_go_to_first_label() {
        let mut records = vec![
            record("ZORTÉA", "SANTA CATARINA", "Mata Atlântica", Some(1.0)),
            record("ABAETÉ", "MINAS GERAIS", "Cerrado", Some(1.0)),
        ];
        annotate(&mut records);
        let summary = summarize(&records, HotspotMetric::Frp);
        assert_eq!(summary.top_municipality_by_count.unwrap().label, "Abaeté-MG");
        assert_eq!(summary.top_biome_by_metric.unwrap().label, "Cerrado");
    }

    #[test]
    fn test_unknown_state_skips_municipality_ranking() {
        let mut records = vec![record("X", "NARNIA", "Cerrado", Some(3.0))];
        annotate(&mut records);
        let summary = summarize(&records, HotspotMetric::Frp);
        assert_eq!(summary.total, 1);
        assert!(summary.top_municipality_by_count.is_none());
        assert_eq!(summary.top_biome_by_count.unwrap().value, 1.0);
    }

    #[test]
    fn test_metric_serde_names() {
        let json = serde_json::to_string(&HotspotMetric::DaysWithoutRain).unwrap();
        assert_eq!(json, "\"days_without_rain\"");
        assert_eq!(HotspotMetric::FireRisk.column(), "risco_fogo");
        assert_eq!(HotspotMetric::ALL.len(), 3);
    }
}
