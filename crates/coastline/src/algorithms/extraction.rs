use std::collections::HashMap;

use geojson::{Feature, PolygonType, Position, Value};
use tracing::{debug, trace};

use crate::{
    catalog::FeatureCatalog,
    config::SourceConfig,
    traits::{CategoryLookup, SegmentExtractor},
    types::{CoastType, Segment, SourceKind},
};

/// Extractor for features that directly represent a shoreline
/// (natural coastline and shoreline construction)
#[derive(Debug, Clone)]
pub struct ExplicitCoastlineExtractor {
    pub include_natural: bool,
    pub include_constructed: bool,
}

impl Default for ExplicitCoastlineExtractor {
    fn default() -> Self {
        Self {
            include_natural: true,
            include_constructed: true,
        }
    }
}

impl SegmentExtractor for ExplicitCoastlineExtractor {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn extract(&self, features: &[Feature], catalog: &FeatureCatalog) -> Vec<Segment> {
        let mut segments = Vec::new();

        for feature in features {
            let Some(class) = catalog.feature_class(feature) else {
                continue;
            };

            let coast_type = if self.include_natural && class == catalog.coastline_class {
                CoastType::Coastline
            } else if self.include_constructed && class == catalog.construction_class {
                CoastType::Constructed
            } else {
                continue;
            };

            let category = match coast_type {
                CoastType::Constructed => catalog.category(feature),
                CoastType::Coastline => None,
            };

            for path in boundary_paths(feature) {
                let mut segment = Segment::new(path, SourceKind::Explicit, class)
                    .with_coast_type(coast_type)
                    .with_category(category);
                if let Some(sub_type) = category.and_then(|code| catalog.subtype_for(code)) {
                    segment = segment.with_sub_type(sub_type);
                }
                push_well_formed(&mut segments, segment);
            }
        }

        segments
    }
}

/// Extractor for depth-area boundaries touching the waterline (minimum depth of exactly 0)
#[derive(Debug, Clone, Default)]
pub struct DepthAreaExtractor;

impl SegmentExtractor for DepthAreaExtractor {
    fn name(&self) -> &'static str {
        "depth_areas"
    }

    fn extract(&self, features: &[Feature], catalog: &FeatureCatalog) -> Vec<Segment> {
        let mut segments = Vec::new();

        for feature in features {
            if catalog.feature_class(feature) != Some(catalog.depth_area_class.as_str()) {
                continue;
            }
            if catalog.min_depth(feature) != Some(0.0) {
                continue;
            }
            for ring in exterior_rings(feature) {
                let segment = Segment::new(ring, SourceKind::Derived, &catalog.depth_area_class);
                push_well_formed(&mut segments, segment);
            }
        }

        segments
    }
}

/// Extractor for land-area boundaries
#[derive(Debug, Clone, Default)]
pub struct LandAreaExtractor;

impl SegmentExtractor for LandAreaExtractor {
    fn name(&self) -> &'static str {
        "land_areas"
    }

    fn extract(&self, features: &[Feature], catalog: &FeatureCatalog) -> Vec<Segment> {
        let mut segments = Vec::new();

        for feature in features {
            if catalog.feature_class(feature) != Some(catalog.land_area_class.as_str()) {
                continue;
            }
            for ring in exterior_rings(feature) {
                let segment = Segment::new(ring, SourceKind::Derived, &catalog.land_area_class);
                push_well_formed(&mut segments, segment);
            }
        }

        segments
    }
}

/// Runs the enabled extractors over a feature batch
#[derive(Debug, Clone, Default)]
pub struct CoastlineExtractor {
    catalog: FeatureCatalog,
}

impl CoastlineExtractor {
    pub fn new(catalog: FeatureCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn extract_explicit_coastlines(&self, features: &[Feature]) -> Vec<Segment> {
        ExplicitCoastlineExtractor::default().extract(features, &self.catalog)
    }

    pub fn extract_from_depth_areas(&self, features: &[Feature]) -> Vec<Segment> {
        DepthAreaExtractor.extract(features, &self.catalog)
    }

    pub fn extract_from_land_areas(&self, features: &[Feature]) -> Vec<Segment> {
        LandAreaExtractor.extract(features, &self.catalog)
    }

    /// Run every extractor enabled in `sources`, then collapse duplicates
    pub fn extract_all_coastlines(&self, features: &[Feature], sources: &SourceConfig) -> Vec<Segment> {
        let segments = self.extract_all_raw(features, sources);
        deduplicate_segments(segments)
    }

    /// Like [`Self::extract_all_coastlines`] but without deduplication
    pub fn extract_all_raw(&self, features: &[Feature], sources: &SourceConfig) -> Vec<Segment> {
        let mut extractors: Vec<Box<dyn SegmentExtractor>> = Vec::new();
        if sources.use_coastlines || sources.use_shoreline_construction {
            extractors.push(Box::new(ExplicitCoastlineExtractor {
                include_natural: sources.use_coastlines,
                include_constructed: sources.use_shoreline_construction,
            }));
        }
        if sources.use_depth_areas {
            extractors.push(Box::new(DepthAreaExtractor));
        }
        if sources.use_land_areas {
            extractors.push(Box::new(LandAreaExtractor));
        }

        let mut segments = Vec::new();
        for extractor in &extractors {
            let extracted = extractor.extract(features, &self.catalog);
            debug!(extractor = extractor.name(), count = extracted.len(), "extracted segments");
            segments.extend(extracted);
        }
        segments
    }
}

/// Collapse segments with identical ordered coordinates into one, keeping the
/// first occurrence's position and the union of all provenance
pub fn deduplicate_segments(segments: Vec<Segment>) -> Vec<Segment> {
    let mut index_by_key: HashMap<Vec<[u64; 2]>, usize> = HashMap::with_capacity(segments.len());
    let mut unique: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        let key = coordinate_key(&segment.coordinates);
        match index_by_key.get(&key) {
            Some(&existing) => {
                let kept = &mut unique[existing];
                kept.source_features.extend(segment.source_features);
                if kept.category.is_none() {
                    kept.category = segment.category;
                }
            }
            None => {
                index_by_key.insert(key, unique.len());
                unique.push(segment);
            }
        }
    }

    unique
}

fn coordinate_key(coords: &[[f64; 2]]) -> Vec<[u64; 2]> {
    // -0.0 and 0.0 must hash alike
    let bits = |v: f64| if v == 0.0 { 0 } else { v.to_bits() };
    coords.iter().map(|&[x, y]| [bits(x), bits(y)]).collect()
}

fn push_well_formed(segments: &mut Vec<Segment>, segment: Segment) {
    if segment.is_well_formed() {
        segments.push(segment);
    } else {
        trace!(points = segment.point_count(), "skipping malformed geometry");
    }
}

/// Lines and polygon exterior rings of a feature
fn boundary_paths(feature: &Feature) -> Vec<Vec<[f64; 2]>> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Vec::new();
    };
    match &geometry.value {
        Value::LineString(line) => convert_positions(line).into_iter().collect(),
        Value::MultiLineString(lines) => lines.iter().filter_map(|line| convert_positions(line)).collect(),
        Value::Polygon(_) | Value::MultiPolygon(_) => exterior_rings(feature),
        _ => Vec::new(),
    }
}

/// Exterior ring of every polygon in a feature
pub(crate) fn exterior_rings(feature: &Feature) -> Vec<Vec<[f64; 2]>> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Vec::new();
    };
    match &geometry.value {
        Value::Polygon(polygon) => exterior_of(polygon).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().filter_map(|polygon| exterior_of(polygon)).collect(),
        _ => Vec::new(),
    }
}

fn exterior_of(polygon: &PolygonType) -> Option<Vec<[f64; 2]>> {
    polygon.first().and_then(|ring| convert_positions(ring))
}

/// `None` when any position lacks an x or y component
fn convert_positions(positions: &[Position]) -> Option<Vec<[f64; 2]>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        })
        .collect()
}
