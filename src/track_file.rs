//! # Track-File Ring Extraction
//!
//! Recovers candidate property boundaries from an uploaded KML document.
//!
//! ## Algorithm
//! 1. Normalize the document: strip the XML prolog and force the canonical KML namespace
//!    on the `<kml>` root (some producers omit or misspell it)
//! 2. Parse with the `kml` crate and convert into an explicit [`FeatureNode`] tree
//! 3. Flatten the tree depth-first, keeping document order
//! 4. Keep tracks with more than one point whose ends coincide and that form a valid ring
//! 5. Rank the resulting [`RingCandidate`]s by enclosed area, largest first
//!
//! A Placemark contributes one track per linear geometry: `LineString`, `LinearRing`,
//! the outer ring of a `Polygon`, or each of those inside a `MultiGeometry`. A `Point`
//! placemark becomes a single-coordinate track, which is always discarded in step 4.

use kml::types::{Coord as KmlCoord, Geometry};
use kml::Kml;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::boundary::Boundary;
use crate::error::{malformed_input, HotspotError, Result};
use crate::geo_utils;
use crate::LatLon;

/// Namespace every normalized document declares on its `<kml>` root.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Label shown for rings whose placemark has no name.
pub const UNNAMED_TRACK_LABEL: &str = "<unnamed>";

static XML_PROLOG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<\?xml[^>]*\?>\s*").unwrap());
static KML_START_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<kml\b[^>]*>").unwrap());
static DEFAULT_NS_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\sxmlns\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

/// A named coordinate sequence from a Placemark geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub coords: Vec<LatLon>,
}

/// Parsed track-file feature tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureNode {
    /// Document, Folder or the `<kml>` root
    Container { children: Vec<FeatureNode> },
    /// Linear geometry leaf
    Track(Track),
}

/// A closed ring offered to the user as a boundary choice.
#[derive(Debug, Clone)]
pub struct RingCandidate {
    /// Placemark name, or [`UNNAMED_TRACK_LABEL`]
    pub label: String,
    pub boundary: Boundary,
    /// Enclosed area in squared degrees (lon/lat plane)
    pub area: f64,
}

impl RingCandidate {
    /// Ring vertices in (latitude, longitude) order, closing vertex included.
    pub fn display_coords(&self) -> &[LatLon] {
        self.boundary.display_coords()
    }
}

// ============================================================================
// Namespace normalization
// ============================================================================

/// Strip the XML prolog and make the `<kml>` root declare [`KML_NAMESPACE`].
///
/// An existing default namespace is rewritten, a missing one is injected. Prefixed
/// declarations such as `xmlns:gx` are left untouched.
///
/// ```rust
/// use hotspot_matcher::normalize_kml_namespace;
///
/// let fixed = normalize_kml_namespace(r#"<?xml version="1.0"?><kml xmlns="http://earth.google.com/kml/2.1"></kml>"#);
/// assert_eq!(fixed, r#"<kml xmlns="http://www.opengis.net/kml/2.2"></kml>"#);
/// ```
pub fn normalize_kml_namespace(content: &str) -> String {
    let content = content.trim_start_matches('\u{feff}');
    let content = XML_PROLOG.replace(content, "");

    let Some(m) = KML_START_TAG.find(&content) else {
        return content.into_owned();
    };

    let tag = m.as_str();
    let fixed = if DEFAULT_NS_ATTR.is_match(tag) {
        let attr = format!(" xmlns=\"{}\"", KML_NAMESPACE);
        DEFAULT_NS_ATTR.replace(tag, NoExpand(&attr)).into_owned()
    } else {
        tag.replacen("<kml", &format!("<kml xmlns=\"{}\"", KML_NAMESPACE), 1)
    };

    let mut out = String::with_capacity(content.len() + KML_NAMESPACE.len() + 16);
    out.push_str(&content[..m.start()]);
    out.push_str(&fixed);
    out.push_str(&content[m.end()..]);
    out
}

// ============================================================================
// Feature tree
// ============================================================================

/// Parse (already normalized) KML text into a feature tree rooted at a Container.
pub fn parse_feature_tree(content: &str) -> Result<FeatureNode> {
    let kml: Kml<f64> = content
        .parse()
        .map_err(|e: kml::Error| HotspotError::TrackFileParse(e.to_string()))?;

    let mut children = Vec::new();
    convert(kml, &mut children);
    Ok(FeatureNode::Container { children })
}

fn convert_all(elements: Vec<Kml<f64>>) -> Vec<FeatureNode> {
    let mut nodes = Vec::new();
    for element in elements {
        convert(element, &mut nodes);
    }
    nodes
}

fn convert(kml: Kml<f64>, out: &mut Vec<FeatureNode>) {
    match kml {
        Kml::KmlDocument(doc) => out.push(FeatureNode::Container {
            children: convert_all(doc.elements),
        }),
        Kml::Document { elements, .. } => out.push(FeatureNode::Container {
            children: convert_all(elements),
        }),
        Kml::Folder(folder) => out.push(FeatureNode::Container {
            children: convert_all(folder.elements),
        }),
        Kml::Placemark(placemark) => {
            if let Some(geometry) = placemark.geometry {
                push_geometry(placemark.name.as_deref(), geometry, out);
            }
        }
        Kml::Point(p) => push_track(None, &[p.coord], out),
        Kml::LineString(ls) => push_track(None, &ls.coords, out),
        Kml::LinearRing(lr) => push_track(None, &lr.coords, out),
        Kml::Polygon(poly) => push_track(None, &poly.outer.coords, out),
        Kml::MultiGeometry(mg) => {
            for geometry in mg.geometries {
                push_geometry(None, geometry, out);
            }
        }
        _ => {}
    }
}

fn push_geometry(name: Option<&str>, geometry: Geometry<f64>, out: &mut Vec<FeatureNode>) {
    match geometry {
        Geometry::Point(p) => push_track(name, &[p.coord], out),
        Geometry::LineString(ls) => push_track(name, &ls.coords, out),
        Geometry::LinearRing(lr) => push_track(name, &lr.coords, out),
        Geometry::Polygon(poly) => push_track(name, &poly.outer.coords, out),
        Geometry::MultiGeometry(mg) => {
            for inner in mg.geometries {
                push_geometry(name, inner, out);
            }
        }
        _ => {}
    }
}

fn push_track(name: Option<&str>, coords: &[KmlCoord<f64>], out: &mut Vec<FeatureNode>) {
    // KML coordinates are lon,lat[,alt]
    let coords = coords.iter().map(|c| LatLon::new(c.y, c.x)).collect();
    out.push(FeatureNode::Track(Track {
        name: name.map(str::to_string),
        coords,
    }));
}

/// Collect every Track in the tree, depth-first, in document order.
pub fn flatten_tracks(node: &FeatureNode) -> Vec<&Track> {
    fn walk<'a>(node: &'a FeatureNode, out: &mut Vec<&'a Track>) {
        match node {
            FeatureNode::Track(track) => out.push(track),
            FeatureNode::Container { children } => {
                for child in children {
                    walk(child, out);
                }
            }
        }
    }

    let mut tracks = Vec::new();
    walk(node, &mut tracks);
    tracks
}

// ============================================================================
// Ring extraction
// ============================================================================

/// Promote closed tracks to ring candidates, largest area first.
///
/// Fails with `NoTracksFound` for an empty slice and `NoClosedRing` when no track
/// closes into a valid ring.
pub fn rings_from_tracks(tracks: &[&Track]) -> Result<Vec<RingCandidate>> {
    if tracks.is_empty() {
        return Err(HotspotError::NoTracksFound);
    }

    let mut candidates: Vec<RingCandidate> = Vec::new();
    for track in tracks {
        if track.coords.len() <= 1 || !geo_utils::is_closed(&track.coords) {
            continue;
        }

        match Boundary::from_lat_lon(track.coords.clone()) {
            Ok(boundary) => candidates.push(RingCandidate {
                label: track.name.clone().unwrap_or_else(|| UNNAMED_TRACK_LABEL.to_string()),
                area: boundary.area(),
                boundary,
            }),
            Err(e) => debug!(
                "[TrackFile] Skipping closed track {:?}: {}",
                track.name.as_deref().unwrap_or(UNNAMED_TRACK_LABEL),
                e
            ),
        }
    }

    if candidates.is_empty() {
        return Err(HotspotError::NoClosedRing { tracks: tracks.len() });
    }

    // stable: equal areas keep document order
    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
    Ok(candidates)
}

/// Full extraction from uploaded bytes: decode, normalize, parse, flatten, rank.
pub fn extract_ring_candidates(bytes: &[u8]) -> Result<Vec<RingCandidate>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| malformed_input(format!("track file is not valid UTF-8: {}", e)))?;

    let normalized = normalize_kml_namespace(text);
    let tree = parse_feature_tree(&normalized)?;
    let tracks = flatten_tracks(&tree);
    let candidates = rings_from_tracks(&tracks)?;

    info!(
        "[TrackFile] {} tracks -> {} ring candidates (largest: {:?}, area {:.6})",
        tracks.len(),
        candidates.len(),
        candidates[0].label,
        candidates[0].area
    );
    Ok(candidates)
}
