//! Unified error handling for the hotspot-matcher library.
//!
//! Every boundary-construction failure is terminal for the current pass: the
//! caller surfaces the message to the user and nothing is retried. An empty
//! remote fetch is deliberately *not* an error (see [`crate::FetchOutcome`]).

use thiserror::Error;

/// Result type alias for hotspot-matcher operations.
pub type Result<T> = std::result::Result<T, HotspotError>;

/// Unified error type for hotspot-matcher operations.
#[derive(Error, Debug)]
pub enum HotspotError {
    /// Manual coordinate text could not be parsed into `[lat, lon]` pairs
    #[error("malformed coordinate input: {0}")]
    MalformedInput(String),

    /// The track file contains no linear geometry at all
    #[error("no tracks or polygons found in track file")]
    NoTracksFound,

    /// Tracks exist but none of them closes into a ring
    #[error("none of the {tracks} tracks in the track file forms a closed ring")]
    NoClosedRing { tracks: usize },

    /// Polygon is empty, too small, zero-area or self-intersecting
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A hotspot record lacks a usable location
    #[error("malformed hotspot record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    /// Track file is not parseable KML
    #[error("track file parse error: {0}")]
    TrackFileParse(String),

    /// Requested ring candidate does not exist
    #[error("ring candidate not found: {0}")]
    CandidateNotFound(String),

    /// Boundary selector already resolved or failed for this pass
    #[error("boundary selector already settled, reset before submitting again")]
    SelectorSettled,

    #[error("CSV error {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP client error {0}")]
    Http(#[from] reqwest::Error),
}

pub fn malformed_input(msg: impl ToString) -> HotspotError {
    HotspotError::MalformedInput(msg.to_string())
}

pub fn invalid_geometry(msg: impl ToString) -> HotspotError {
    HotspotError::InvalidGeometry(msg.to_string())
}
