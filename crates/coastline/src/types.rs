use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use ts_rs::TS;

use crate::geometry::{self, CLOSURE_EPSILON_DEG};

/// Whether a segment is an open polyline or a closed ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeometryKind {
    Line,
    Ring,
}

/// Shoreline type for segments taken from explicit shoreline features
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema, TS,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoastType {
    Coastline,
    Constructed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, JsonSchema, TS,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubType {
    Mainland,
    Island,
    Pier,
    Wharf,
    Seawall,
}

/// Whether the originating feature directly represents a shoreline (explicit)
/// or is the boundary of an area feature (derived)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema, TS,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    Explicit,
    Derived,
}

/// Side of a polyline (relative to its direction of travel) that is navigable water
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, JsonSchema, TS,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaterSide {
    Left,
    Right,
    #[default]
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillMethod {
    /// Straight interpolation between the two gap endpoints
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Start,
    End,
}

/// A single-path polyline with provenance and classification metadata.
///
/// Segments are treated as values: every transformation returns a new
/// instance through [`Segment::with_coordinates`] or one of the pipeline
/// stages, the input is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Ordered `[lon, lat]` pairs
    pub coordinates: Vec<[f64; 2]>,
    pub geometry_kind: GeometryKind,
    pub coast_type: Option<CoastType>,
    pub sub_type: Option<SubType>,
    pub source: SourceKind,
    /// Feature classes that contributed to this segment. Only ever grows.
    pub source_features: BTreeSet<String>,
    /// Shoreline-construction category code, when the source carried one
    pub category: Option<u32>,
    pub stitched: bool,
    /// Number of input segments joined to produce this one
    pub merged_count: usize,
    pub gap_count: usize,
    pub gap_filled: bool,
}

impl Segment {
    /// Create an unstitched segment originating from a single feature class
    pub fn new(coordinates: Vec<[f64; 2]>, source: SourceKind, feature_class: impl Into<String>) -> Self {
        let geometry_kind = geometry_kind_of(&coordinates);
        Self {
            coordinates,
            geometry_kind,
            coast_type: None,
            sub_type: None,
            source,
            source_features: BTreeSet::from([feature_class.into()]),
            category: None,
            stitched: false,
            merged_count: 1,
            gap_count: 0,
            gap_filled: false,
        }
    }

    pub fn with_coast_type(mut self, coast_type: CoastType) -> Self {
        self.coast_type = Some(coast_type);
        self
    }

    pub fn with_category(mut self, category: Option<u32>) -> Self {
        self.category = category;
        self
    }

    pub fn with_sub_type(mut self, sub_type: SubType) -> Self {
        self.sub_type = Some(sub_type);
        self
    }

    /// Same metadata, new geometry. The geometry kind is re-derived.
    pub fn with_coordinates(&self, coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            geometry_kind: geometry_kind_of(&coordinates),
            coordinates,
            ..self.clone()
        }
    }

    /// Same metadata, coordinates in reverse order
    pub fn reversed(&self) -> Self {
        self.with_coordinates(geometry::reverse_line(&self.coordinates))
    }

    pub fn start(&self) -> Option<[f64; 2]> {
        self.coordinates.first().copied()
    }

    pub fn end(&self) -> Option<[f64; 2]> {
        self.coordinates.last().copied()
    }

    pub fn endpoint(&self, which: Endpoint) -> Option<[f64; 2]> {
        match which {
            Endpoint::Start => self.start(),
            Endpoint::End => self.end(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.coordinates.len()
    }

    /// First and last coordinates coincide within the closure epsilon
    pub fn is_closed(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) if self.coordinates.len() > 2 => {
                geometry::points_equal(&start, &end, CLOSURE_EPSILON_DEG)
            }
            _ => false,
        }
    }

    /// At least two coordinates, all finite and in range
    pub fn is_well_formed(&self) -> bool {
        self.coordinates.len() >= 2 && self.coordinates.iter().all(geometry::is_valid_coordinate)
    }

    /// Great-circle length in meters
    pub fn length_m(&self) -> f64 {
        geometry::line_length(&self.coordinates)
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        if self.coordinates.is_empty() {
            return None;
        }
        let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
        for &[lon, lat] in &self.coordinates {
            bbox[0] = bbox[0].min(lon);
            bbox[1] = bbox[1].min(lat);
            bbox[2] = bbox[2].max(lon);
            bbox[3] = bbox[3].max(lat);
        }
        Some(bbox)
    }
}

fn geometry_kind_of(coordinates: &[[f64; 2]]) -> GeometryKind {
    match (coordinates.first(), coordinates.last()) {
        (Some(first), Some(last)) if coordinates.len() > 2 && first == last => GeometryKind::Ring,
        _ => GeometryKind::Line,
    }
}

/// Endpoints of one segment and the segments reachable from either of them
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConnections {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub connections: Vec<usize>,
}

/// Endpoint adjacency graph, indexed like the segment slice it was built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionMap {
    pub nodes: Vec<EndpointConnections>,
}

impl ConnectionMap {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|node| node.connections.as_slice())
            .unwrap_or(&[])
    }

    /// Number of undirected connections in the graph
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.connections.len()).sum::<usize>() / 2
    }
}

/// Pair of unconnected endpoints from two different segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Gap {
    pub start: [f64; 2],
    pub end: [f64; 2],
    /// Great-circle separation in meters
    pub distance: f64,
    pub filled: bool,
    pub fill_method: Option<FillMethod>,
    pub from_segment: usize,
    pub from_endpoint: Endpoint,
    pub to_segment: usize,
    pub to_endpoint: Endpoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoastlineMetrics {
    pub length_m: f64,
    pub length_nm: f64,
    /// Mean bearing over all legs, degrees in `[0, 360)`
    pub orientation: f64,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Output polyline with its post-processing annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotatedCoastline {
    pub segment: Segment,
    pub metrics: CoastlineMetrics,
    pub water_side: WaterSide,
    /// Start and end coincide
    pub continuous: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceStats {
    pub count: usize,
    pub length_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingStats {
    pub segments_extracted: usize,
    pub segments_after_dedup: usize,
    pub segments_after_stitching: usize,
    pub gaps_detected: usize,
    pub gaps_filled: usize,
    pub continuous_count: usize,
    pub total_length_m: f64,
    pub total_length_nm: f64,
    /// Keyed by feature class
    pub by_source: BTreeMap<String, SourceStats>,
}

/// Final product of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoastlineResult {
    pub coastlines: Vec<AnnotatedCoastline>,
    /// Gaps still open after stitching and filling
    pub gaps: Vec<Gap>,
    pub stats: ProcessingStats,
}

impl CoastlineResult {
    pub fn len(&self) -> usize {
        self.coastlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coastlines.is_empty()
    }

    pub fn coastlines_of(&self, sub_type: SubType) -> impl Iterator<Item = &AnnotatedCoastline> {
        self.coastlines
            .iter()
            .filter(move |c| c.segment.sub_type == Some(sub_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Segment {
        Segment::new(vec![[0.0, 0.0], [1.0, 0.0], [2.0, 1.0]], SourceKind::Explicit, "COALNE")
    }

    #[test]
    fn test_new_segment_defaults() {
        let segment = line();
        assert_eq!(segment.geometry_kind, GeometryKind::Line);
        assert!(!segment.stitched);
        assert_eq!(segment.merged_count, 1);
        assert_eq!(segment.gap_count, 0);
        assert!(segment.source_features.contains("COALNE"));
    }

    #[test]
    fn test_ring_detection() {
        let ring = Segment::new(
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
            SourceKind::Derived,
            "LNDARE",
        );
        assert_eq!(ring.geometry_kind, GeometryKind::Ring);
        assert!(ring.is_closed());
        assert!(!line().is_closed());
    }

    #[test]
    fn test_reversed_keeps_metadata() {
        let segment = line().with_coast_type(CoastType::Coastline);
        let reversed = segment.reversed();
        assert_eq!(reversed.start(), Some([2.0, 1.0]));
        assert_eq!(reversed.end(), Some([0.0, 0.0]));
        assert_eq!(reversed.coast_type, Some(CoastType::Coastline));
        assert_eq!(reversed.source_features, segment.source_features);
        // the original value is untouched
        assert_eq!(segment.start(), Some([0.0, 0.0]));
    }

    #[test]
    fn test_well_formed() {
        assert!(line().is_well_formed());
        let single = Segment::new(vec![[0.0, 0.0]], SourceKind::Explicit, "COALNE");
        assert!(!single.is_well_formed());
        let nan = Segment::new(vec![[0.0, 0.0], [f64::NAN, 1.0]], SourceKind::Explicit, "COALNE");
        assert!(!nan.is_well_formed());
    }

    #[test]
    fn test_bounding_box() {
        assert_eq!(line().bounding_box(), Some([0.0, 0.0, 2.0, 1.0]));
    }

    #[test]
    fn test_connection_map_edge_count() {
        let map = ConnectionMap {
            nodes: vec![
                EndpointConnections { start: [0.0, 0.0], end: [1.0, 0.0], connections: vec![1] },
                EndpointConnections { start: [1.0, 0.0], end: [2.0, 0.0], connections: vec![0] },
            ],
        };
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.neighbors(0), &[1]);
        assert!(map.neighbors(5).is_empty());
    }
}
