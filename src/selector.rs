//! Boundary source selection.
//!
//! The user supplies a boundary either as a manual coordinate list or as an uploaded
//! track file. Both paths end in a single [`ResolvedBoundary`]. A track file may hold
//! several closed rings; the user picks one with a [`CandidateSelection`], and the
//! largest ring is used by default.
//!
//! ## State machine
//!
//! ```text
//! AwaitingInput --submit ok--> Resolved
//! AwaitingInput --submit err-> Failed
//! Resolved | Failed --reset--> AwaitingInput
//! ```
//!
//! `Resolved` and `Failed` are terminal for the pass. A second submit is rejected with
//! [`HotspotError::SelectorSettled`] until [`BoundarySelector::reset`] is called.

use log::{info, warn};

use crate::boundary::{normalize_manual, Boundary};
use crate::error::{HotspotError, Result};
use crate::track_file::{extract_ring_candidates, RingCandidate};
use crate::LatLon;

/// Raw user input for the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundarySource {
    /// JSON `[[lat, lon], ...]` text
    Manual(String),
    /// Uploaded KML bytes
    TrackFile(Vec<u8>),
}

/// Which input path produced a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOrigin {
    Manual,
    TrackFile,
}

/// Which ring candidate to use from a track file. Ignored for manual input.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CandidateSelection {
    /// The ring with the largest area
    #[default]
    Largest,
    /// Position in the descending-area candidate list
    Index(usize),
    /// First candidate whose label matches exactly
    Label(String),
}

/// Label and area of one offered candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub label: String,
    pub area: f64,
}

/// The selected boundary plus what the user could have chosen from.
#[derive(Debug, Clone)]
pub struct ResolvedBoundary {
    pub origin: BoundaryOrigin,
    pub boundary: Boundary,
    /// Every candidate, descending area. A single entry for manual input.
    pub candidates: Vec<CandidateSummary>,
    /// Index into `candidates`
    pub selected: usize,
}

impl ResolvedBoundary {
    /// Vertices in (latitude, longitude) order for rendering.
    pub fn display_coords(&self) -> &[LatLon] {
        self.boundary.display_coords()
    }

    /// Label of the selected candidate.
    pub fn label(&self) -> &str {
        &self.candidates[self.selected].label
    }

    /// Resolve `source` without going through a selector.
    pub fn resolve(source: BoundarySource, selection: &CandidateSelection) -> Result<Self> {
        match source {
            BoundarySource::Manual(text) => {
                let boundary = normalize_manual(&text)?;
                let candidates = vec![CandidateSummary {
                    label: "manual".to_string(),
                    area: boundary.area(),
                }];
                Ok(Self {
                    origin: BoundaryOrigin::Manual,
                    boundary,
                    candidates,
                    selected: 0,
                })
            }
            BoundarySource::TrackFile(bytes) => {
                let rings = extract_ring_candidates(&bytes)?;
                let selected = select_candidate(&rings, selection)?;
                let candidates = rings
                    .iter()
                    .map(|c| CandidateSummary {
                        label: c.label.clone(),
                        area: c.area,
                    })
                    .collect();
                let boundary = rings
                    .into_iter()
                    .nth(selected)
                    .map(|c| c.boundary)
                    .ok_or_else(|| HotspotError::CandidateNotFound(format!("index {}", selected)))?;
                Ok(Self {
                    origin: BoundaryOrigin::TrackFile,
                    boundary,
                    candidates,
                    selected,
                })
            }
        }
    }
}

/// Index of the requested candidate in a descending-area list.
fn select_candidate(candidates: &[RingCandidate], selection: &CandidateSelection) -> Result<usize> {
    match selection {
        CandidateSelection::Largest if !candidates.is_empty() => Ok(0),
        CandidateSelection::Largest => Err(HotspotError::CandidateNotFound("largest".to_string())),
        CandidateSelection::Index(i) if *i < candidates.len() => Ok(*i),
        CandidateSelection::Index(i) => Err(HotspotError::CandidateNotFound(format!(
            "index {} (only {} candidates)",
            i,
            candidates.len()
        ))),
        CandidateSelection::Label(name) => candidates
            .iter()
            .position(|c| &c.label == name)
            .ok_or_else(|| HotspotError::CandidateNotFound(format!("label {:?}", name))),
    }
}

/// Where the selector is in its lifecycle.
#[derive(Debug, Clone, Default)]
pub enum SelectorState {
    #[default]
    AwaitingInput,
    Resolved(ResolvedBoundary),
    /// Message of the error that ended the pass
    Failed(String),
}

/// One-shot boundary selector for a single pass.
#[derive(Debug, Default)]
pub struct BoundarySelector {
    state: SelectorState,
}

impl BoundarySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// The resolved boundary, if any.
    pub fn resolved(&self) -> Option<&ResolvedBoundary> {
        match &self.state {
            SelectorState::Resolved(r) => Some(r),
            _ => None,
        }
    }

    /// Normalize `source` and settle the selector.
    ///
    /// On error the selector moves to `Failed` and the error is returned to the caller.
    pub fn submit(
        &mut self,
        source: BoundarySource,
        selection: &CandidateSelection,
    ) -> Result<&ResolvedBoundary> {
        if !matches!(self.state, SelectorState::AwaitingInput) {
            return Err(HotspotError::SelectorSettled);
        }

        match ResolvedBoundary::resolve(source, selection) {
            Ok(resolved) => {
                info!(
                    "[BoundarySelector] Resolved {:?} boundary {:?} ({} of {} candidates)",
                    resolved.origin,
                    resolved.label(),
                    resolved.selected + 1,
                    resolved.candidates.len()
                );
                self.state = SelectorState::Resolved(resolved);
                match &self.state {
                    SelectorState::Resolved(resolved) => Ok(resolved),
                    _ => unreachable!("state was set to Resolved above"),
                }
            }
            Err(e) => {
                warn!("[BoundarySelector] Boundary rejected: {}", e);
                self.state = SelectorState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Back to `AwaitingInput` so the user can submit again.
    pub fn reset(&mut self) {
        self.state = SelectorState::AwaitingInput;
    }
}
