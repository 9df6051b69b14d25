//! Daily hotspot table: CSV decoding and derived display fields.
//!
//! Rows come from the national daily CSV product. Column names are Portuguese; the Rust
//! fields are renamed on decode. Unknown columns are ignored and missing ones default,
//! so older and newer file layouts both load. `-999` (the product's "no value" marker)
//! in numeric columns decodes as `None`.

use std::collections::HashMap;
use std::io;

use chrono::NaiveDateTime;
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{malformed_input, Result};
use crate::LatLon;

/// Timestamp layout of the `data_hora_gmt` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MISSING_VALUE_SENTINEL: f64 = -999.0;

/// One detected hotspot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotRecord {
    #[serde(rename = "lat")]
    pub latitude: Option<f64>,
    #[serde(rename = "lon")]
    pub longitude: Option<f64>,
    /// Detection time (GMT), `YYYY-MM-DD HH:MM:SS`
    #[serde(rename = "data_hora_gmt")]
    pub observed_at: String,
    #[serde(rename = "satelite")]
    pub satellite: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "pais")]
    pub country: String,
    #[serde(rename = "numero_dias_sem_chuva", deserialize_with = "de_optional_value")]
    pub days_without_rain: Option<f64>,
    #[serde(rename = "precipitacao", deserialize_with = "de_optional_value")]
    pub precipitation: Option<f64>,
    #[serde(rename = "risco_fogo", deserialize_with = "de_optional_value")]
    pub fire_risk: Option<f64>,
    #[serde(rename = "bioma")]
    pub biome: String,
    /// Fire radiative power (MW)
    #[serde(deserialize_with = "de_optional_value")]
    pub frp: Option<f64>,

    /// Two-letter state code, set by [`annotate`]
    #[serde(skip_deserializing)]
    pub state_code: Option<String>,
    /// `Municipality-UF` label, set by [`annotate`]
    #[serde(skip_deserializing)]
    pub municipality_label: Option<String>,
}

impl HotspotRecord {
    /// A bare record at the given location, all attributes empty.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    /// Location, if both coordinates are present.
    pub fn location(&self) -> Option<LatLon> {
        Some(LatLon::new(self.latitude?, self.longitude?))
    }

    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.observed_at.trim(), TIMESTAMP_FORMAT).ok()
    }

    /// Marker popup text shown on the property map.
    pub fn popup_text(&self) -> String {
        let risk = self
            .fire_risk
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("Date: {}\nRisk: {}", self.observed_at, risk)
    }
}

fn de_optional_value<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite() && *v != MISSING_VALUE_SENTINEL))
}

/// Decode a daily hotspot CSV. An empty document yields no rows.
///
/// A row that fails to decode is skipped and counted, so one bad cell does not cost
/// the rest of the day. A non-empty header without `lat` and `lon` is an error: the
/// body is not a hotspot table at all.
pub fn parse_hotspot_csv(reader: impl io::Read) -> Result<Vec<HotspotRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?;
    if !headers.is_empty() && !(headers.iter().any(|h| h == "lat") && headers.iter().any(|h| h == "lon")) {
        return Err(malformed_input("CSV header has no lat/lon columns"));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for res in csv_reader.deserialize::<HotspotRecord>() {
        match res {
            Ok(record) => records.push(record),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!("[Hotspot] Skipping CSV row: {}", e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("[Hotspot] Skipped {} undecodable CSV rows", skipped);
    }
    debug!("[Hotspot] Decoded {} CSV rows", records.len());
    Ok(records)
}

// ============================================================================
// State annotations
// ============================================================================

static STATE_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ACRE", "AC"),
        ("ALAGOAS", "AL"),
        ("AMAPÁ", "AP"),
        ("AMAZONAS", "AM"),
        ("BAHIA", "BA"),
        ("CEARÁ", "CE"),
        ("DISTRITO FEDERAL", "DF"),
        ("ESPÍRITO SANTO", "ES"),
        ("GOIÁS", "GO"),
        ("MARANHÃO", "MA"),
        ("MATO GROSSO", "MT"),
        ("MATO GROSSO DO SUL", "MS"),
        ("MINAS GERAIS", "MG"),
        ("PARÁ", "PA"),
        ("PARAÍBA", "PB"),
        ("PARANÁ", "PR"),
        ("PERNAMBUCO", "PE"),
        ("PIAUÍ", "PI"),
        ("RIO DE JANEIRO", "RJ"),
        ("RIO GRANDE DO NORTE", "RN"),
        ("RIO GRANDE DO SUL", "RS"),
        ("RONDÔNIA", "RO"),
        ("RORAIMA", "RR"),
        ("SANTA CATARINA", "SC"),
        ("SÃO PAULO", "SP"),
        ("SERGIPE", "SE"),
        ("TOCANTINS", "TO"),
    ])
});

/// Two-letter code for a full Brazilian state name (case-insensitive).
///
/// ```rust
/// use hotspot_matcher::state_code;
/// assert_eq!(state_code("MATO GROSSO DO SUL"), Some("MS"));
/// assert_eq!(state_code("São Paulo"), Some("SP"));
/// assert_eq!(state_code("Atlantis"), None);
/// ```
pub fn state_code(state_name: &str) -> Option<&'static str> {
    STATE_CODES.get(state_name.trim().to_uppercase().as_str()).copied()
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// Any non-alphabetic character starts a new word, so `"D'OESTE"` becomes `"D'Oeste"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Fill `state_code` and `municipality_label` for every record.
///
/// Records with an unknown state get neither field.
pub fn annotate(records: &mut [HotspotRecord]) {
    for record in records.iter_mut() {
        let code = state_code(&record.state);
        record.state_code = code.map(str::to_string);
        record.municipality_label =
            code.map(|c| format!("{}-{}", title_case(record.municipality.trim()), c));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HotspotError;

    const SAMPLE_CSV: &str = "\
id,lat,lon,data_hora_gmt,satelite,municipio,estado,pais,municipio_id,estado_id,pais_id,numero_dias_sem_chuva,precipitacao,risco_fogo,bioma,frp
1,-19.0092,-57.6533,2024-08-01 17:20:00,AQUA_M-T,CORUMBÁ,MATO GROSSO DO SUL,Brasil,5003207,50,33,12,0.0,1.0,Pantanal,35.2
2,-3.1,-60.0,2024-08-01 04:10:00,NOAA-20,MANAUS,AMAZONAS,Brasil,1302603,13,33,-999,,-999,Amazônia,
3,,-45.0,2024-08-01 04:10:00,NOAA-20,X,NARNIA,Brasil,0,0,33,1,1,0.5,Cerrado,2.5
";

    #[test]
    fn test_parse_sample_csv() {
        let records = parse_hotspot_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.latitude, Some(-19.0092));
        assert_eq!(first.longitude, Some(-57.6533));
        assert_eq!(first.municipality, "CORUMBÁ");
        assert_eq!(first.biome, "Pantanal");
        assert_eq!(first.frp, Some(35.2));
        assert_eq!(first.days_without_rain, Some(12.0));
        assert!(first.observed_at().is_some());
    }

    #[test]
    fn test_missing_values_decode_as_none() {
        let records = parse_hotspot_csv(SAMPLE_CSV.as_bytes()).unwrap();
        let second = &records[1];
        assert_eq!(second.days_without_rain, None);
        assert_eq!(second.precipitation, None);
        assert_eq!(second.fire_risk, None);
        assert_eq!(second.frp, None);

        let third = &records[2];
        assert_eq!(third.latitude, None);
        assert!(third.location().is_none());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_hotspot_csv("".as_bytes()).unwrap().is_empty());
        let header_only = "lat,lon,data_hora_gmt\n";
        assert!(parse_hotspot_csv(header_only.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_bad_row_is_skipped() {
        let csv = "lat,lon,frp\nabc,1.0,2.0\n-20.0,-55.0,3.5\n-21.0,-56.0,x\n";
        let records = parse_hotspot_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, Some(-20.0));
        assert_eq!(records[0].frp, Some(3.5));
    }

    #[test]
    fn test_table_without_location_columns() {
        let html = "<html><body>Not Found</body></html>\n";
        assert!(matches!(
            parse_hotspot_csv(html.as_bytes()),
            Err(HotspotError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_all_states_mapped() {
        assert_eq!(STATE_CODES.len(), 27);
        assert_eq!(state_code("  piauí "), Some("PI"));
        assert_eq!(state_code("DISTRITO FEDERAL"), Some("DF"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("CORUMBÁ"), "Corumbá");
        assert_eq!(title_case("SÃO JOSÉ DO RIO PRETO"), "São José Do Rio Preto");
        assert_eq!(title_case("ALTA FLORESTA D'OESTE"), "Alta Floresta D'Oeste");
    }

    #[test]
    fn test_annotate() {
        let mut records = parse_hotspot_csv(SAMPLE_CSV.as_bytes()).unwrap();
        annotate(&mut records);
        assert_eq!(records[0].state_code.as_deref(), Some("MS"));
        assert_eq!(records[0].municipality_label.as_deref(), Some("Corumbá-MS"));
        assert_eq!(records[1].municipality_label.as_deref(), Some("Manaus-AM"));
        assert_eq!(records[2].state_code, None);
        assert_eq!(records[2].municipality_label, None);
    }

    #[test]
    fn test_popup_text() {
        let mut r = HotspotRecord::at(-20.0, -55.0);
        r.observed_at = "2024-08-01 17:20:00".to_string();
        r.fire_risk = Some(0.8);
        assert_eq!(r.popup_text(), "Date: 2024-08-01 17:20:00\nRisk: 0.8");
    }
}
