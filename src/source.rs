//! Hotspot sources.
//!
//! A source answers "which hotspots were detected on this date". Fetching is fail-soft:
//! every failure mode collapses into [`FetchOutcome::Empty`] with a reason, so a pass
//! still renders its map and metrics with zero hotspots.

use std::fmt;

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::hotspot::{parse_hotspot_csv, HotspotRecord};

/// Where and how to fetch the daily product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory URL holding `focos_diario_br_YYYYMMDD.csv` files
    pub base_url: String,
    /// Whole-request timeout in seconds. Default: 30
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dataserver-coids.inpe.br/queimadas/queimadas/focos/csv/diario/Brasil"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    /// URL of the daily file for `date`.
    pub fn url_for_date(&self, date: NaiveDate) -> String {
        format!(
            "{}/focos_diario_br_{}.csv",
            self.base_url.trim_end_matches('/'),
            date.format("%Y%m%d")
        )
    }
}

/// Why a fetch produced no rows.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyReason {
    /// Server answered with a non-success status
    HttpStatus(u16),
    /// Success status but nothing in the body
    EmptyBody,
    /// Connection, TLS or timeout failure
    Transport(String),
    /// Body was not a decodable hotspot CSV
    Decode(String),
    /// Decoded fine, just no detections that day
    NoRows,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::HttpStatus(code) => write!(f, "HTTP {}", code),
            EmptyReason::EmptyBody => write!(f, "empty body"),
            EmptyReason::Transport(msg) => write!(f, "transport error: {}", msg),
            EmptyReason::Decode(msg) => write!(f, "decode error: {}", msg),
            EmptyReason::NoRows => write!(f, "no rows"),
        }
    }
}

/// Result of fetching one day of hotspots.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Vec<HotspotRecord>),
    Empty(EmptyReason),
}

impl FetchOutcome {
    /// Decode a CSV body, mapping every failure to `Empty`. Undecodable rows are skipped.
    pub fn from_csv_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return FetchOutcome::Empty(EmptyReason::EmptyBody);
        }
        match parse_hotspot_csv(body) {
            Ok(records) if records.is_empty() => FetchOutcome::Empty(EmptyReason::NoRows),
            Ok(records) => FetchOutcome::Loaded(records),
            Err(e) => {
                warn!("[HotspotSource] Discarding undecodable CSV body: {}", e);
                FetchOutcome::Empty(EmptyReason::Decode(e.to_string()))
            }
        }
    }

    /// The fetched rows; an empty outcome is an empty table.
    pub fn into_records(self) -> Vec<HotspotRecord> {
        match self {
            FetchOutcome::Loaded(records) => records,
            FetchOutcome::Empty(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FetchOutcome::Empty(_))
    }
}

/// Anything that can supply a day of hotspots.
pub trait HotspotSource {
    fn fetch_daily(&self, date: NaiveDate) -> FetchOutcome;
}

/// Fixed in-memory table, served for every date.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<HotspotRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<HotspotRecord>) -> Self {
        Self { records }
    }

    /// Build from CSV text with the same fail-soft rules as a remote body.
    pub fn from_csv(body: &str) -> Self {
        Self::new(FetchOutcome::from_csv_body(body.as_bytes()).into_records())
    }
}

impl HotspotSource for StaticSource {
    fn fetch_daily(&self, _date: NaiveDate) -> FetchOutcome {
        if self.records.is_empty() {
            FetchOutcome::Empty(EmptyReason::NoRows)
        } else {
            FetchOutcome::Loaded(self.records.clone())
        }
    }
}
