use geo_types::Polygon;
use tracing::debug;

use crate::{
    config::ProcessingOptions,
    error::Result,
    geometry::round_coordinate,
    traits::{SegmentSimplifier, SegmentSmoother},
    typed_geojson::CoastlineProperties,
    types::{AnnotatedCoastline, CoastlineMetrics, Segment, WaterSide},
};

use super::{
    metrics::calculate_metrics,
    simplification::{simplifier_for, WeightedAverageSmoother},
    water_side::determine_water_side,
};

/// Estimated serialized bytes per coordinate pair
pub const BYTES_PER_COORDINATE: usize = 24;
/// Estimated fixed bytes per feature
pub const BYTES_PER_FEATURE: usize = 100;
/// Estimated fixed bytes per feature collection
pub const BYTES_PER_COLLECTION: usize = 50;

/// Post-processing of stitched polylines
pub struct CoastlineProcessor {
    options: ProcessingOptions,
    simplifier: Box<dyn SegmentSimplifier>,
    smoother: Box<dyn SegmentSmoother>,
}

impl std::fmt::Debug for CoastlineProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoastlineProcessor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for CoastlineProcessor {
    fn default() -> Self {
        let options = ProcessingOptions::default();
        Self {
            simplifier: simplifier_for(options.simplify_method),
            smoother: Box::new(WeightedAverageSmoother),
            options,
        }
    }
}

impl CoastlineProcessor {
    pub fn new(options: ProcessingOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            simplifier: simplifier_for(options.simplify_method),
            smoother: Box::new(WeightedAverageSmoother),
            options,
        })
    }

    pub fn with_simplifier<S: SegmentSimplifier + 'static>(mut self, simplifier: S) -> Self {
        self.simplifier = Box::new(simplifier);
        self
    }

    pub fn with_smoother<S: SegmentSmoother + 'static>(mut self, smoother: S) -> Self {
        self.smoother = Box::new(smoother);
        self
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn simplify_coastline(&self, segment: &Segment, tolerance_m: f64) -> Segment {
        self.simplifier.simplify(segment, tolerance_m)
    }

    pub fn smooth_coastline(&self, segment: &Segment, iterations: usize) -> Segment {
        self.smoother.smooth(segment, iterations)
    }

    pub fn determine_water_side(&self, segment: &Segment, water: &[Polygon<f64>]) -> WaterSide {
        determine_water_side(segment, water)
    }

    pub fn calculate_metrics(&self, segment: &Segment) -> CoastlineMetrics {
        calculate_metrics(segment)
    }

    /// Simplify, smooth, measure, orient and check closure, as configured
    pub fn process_coastline(&self, segment: &Segment, water: &[Polygon<f64>]) -> AnnotatedCoastline {
        let mut segment = segment.clone();
        if self.options.simplify {
            segment = self.simplify_coastline(&segment, self.options.simplify_tolerance_m);
        }
        if self.options.smooth {
            segment = self.smooth_coastline(&segment, self.options.smooth_iterations);
        }

        let metrics = self.calculate_metrics(&segment);
        let water_side = if self.options.determine_water_side {
            self.determine_water_side(&segment, water)
        } else {
            WaterSide::Unknown
        };
        let continuous = segment.is_closed();

        AnnotatedCoastline {
            segment,
            metrics,
            water_side,
            continuous,
        }
    }

    pub fn process_all(&self, segments: &[Segment], water: &[Polygon<f64>]) -> Vec<AnnotatedCoastline> {
        let processed: Vec<AnnotatedCoastline> = segments
            .iter()
            .map(|segment| self.process_coastline(segment, water))
            .collect();
        debug!(count = processed.len(), water_polygons = water.len(), "processed coastlines");
        processed
    }
}

/// Round every coordinate, including metric endpoints, to six decimals
pub fn reduce_coordinate_precision(coastlines: &[AnnotatedCoastline]) -> Vec<AnnotatedCoastline> {
    let round = |[lon, lat]: [f64; 2]| [round_coordinate(lon), round_coordinate(lat)];
    coastlines
        .iter()
        .map(|coastline| {
            let coordinates = coastline.segment.coordinates.iter().copied().map(round).collect();
            AnnotatedCoastline {
                segment: coastline.segment.with_coordinates(coordinates),
                metrics: CoastlineMetrics {
                    start: round(coastline.metrics.start),
                    end: round(coastline.metrics.end),
                    ..coastline.metrics
                },
                ..coastline.clone()
            }
        })
        .collect()
}

fn feature_size(id: usize, coastline: &AnnotatedCoastline) -> usize {
    let properties = CoastlineProperties::from_coastline(id as u32, coastline);
    let properties_len = serde_json::to_string(&properties).map(|s| s.len()).unwrap_or(0);
    BYTES_PER_FEATURE + BYTES_PER_COORDINATE * coastline.segment.point_count() + properties_len
}

/// Approximate size in bytes of the GeoJSON rendering of `coastlines`
pub fn estimate_response_size(coastlines: &[AnnotatedCoastline]) -> usize {
    BYTES_PER_COLLECTION
        + coastlines
            .iter()
            .enumerate()
            .map(|(i, coastline)| feature_size(i, coastline))
            .sum::<usize>()
}

/// Longest coastlines whose estimated rendering fits in `max_bytes`, in
/// their original order. Stops at the first coastline that does not fit.
pub fn truncate_to_budget(coastlines: &[AnnotatedCoastline], max_bytes: usize) -> Vec<AnnotatedCoastline> {
    let mut by_length: Vec<usize> = (0..coastlines.len()).collect();
    by_length.sort_by(|&a, &b| coastlines[b].metrics.length_m.total_cmp(&coastlines[a].metrics.length_m));

    let mut used = BYTES_PER_COLLECTION;
    let mut kept = Vec::new();
    for index in by_length {
        let size = feature_size(index, &coastlines[index]);
        if used + size > max_bytes {
            break;
        }
        used += size;
        kept.push(index);
    }
    kept.sort_unstable();
    kept.into_iter().map(|index| coastlines[index].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SimplifyMethod, geometry::polygon_from_ring, types::SourceKind};

    fn zigzag() -> Segment {
        Segment::new(
            (0..=12)
                .map(|i| [i as f64 * 0.0004, if i % 2 == 0 { 0.0 } else { 0.00002 }])
                .collect(),
            SourceKind::Explicit,
            "COALNE",
        )
    }

    #[test]
    fn test_process_defaults_only_measure() {
        let processor = CoastlineProcessor::default();
        let segment = zigzag();
        let annotated = processor.process_coastline(&segment, &[]);
        assert_eq!(annotated.segment, segment);
        assert!(annotated.metrics.length_m > 0.0);
        assert_eq!(annotated.water_side, WaterSide::Unknown);
        assert!(!annotated.continuous);
    }

    #[test]
    fn test_process_with_simplify_and_smooth() {
        let options = ProcessingOptions {
            simplify: true,
            simplify_tolerance_m: 10.0,
            smooth: true,
            smooth_iterations: 2,
            ..ProcessingOptions::default()
        };
        let processor = CoastlineProcessor::new(options).expect("Should create processor");
        let segment = zigzag();
        let annotated = processor.process_coastline(&segment, &[]);
        assert!(annotated.segment.point_count() < segment.point_count());
        assert_eq!(annotated.segment.start(), segment.start());
        assert_eq!(annotated.segment.end(), segment.end());
        assert_eq!(annotated.metrics.start, segment.start().expect("Should have a start"));
    }

    #[test]
    fn test_process_visvalingam() {
        let options = ProcessingOptions {
            simplify: true,
            simplify_method: SimplifyMethod::VisvalingamWhyatt,
            ..ProcessingOptions::default()
        };
        let processor = CoastlineProcessor::new(options).expect("Should create processor");
        let annotated = processor.process_coastline(&zigzag(), &[]);
        assert!(annotated.segment.point_count() <= zigzag().point_count());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ProcessingOptions {
            simplify_tolerance_m: -5.0,
            ..ProcessingOptions::default()
        };
        assert!(CoastlineProcessor::new(options).is_err());
    }

    #[test]
    fn test_water_side_and_continuity() {
        let processor = CoastlineProcessor::default();
        let ring = Segment::new(
            vec![[0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.01], [0.0, 0.0]],
            SourceKind::Derived,
            "LNDARE",
        );
        let sea = polygon_from_ring(&[[-0.1, -0.1], [0.1, -0.1], [0.1, 0.1], [-0.1, 0.1]]);
        let annotated = processor.process_coastline(&ring, &[sea]);
        assert!(annotated.continuous);
        // both probes land in the surrounding sea, so no sample votes
        assert_eq!(annotated.water_side, WaterSide::Unknown);
    }

    #[test]
    fn test_precision_reduction() {
        let segment = Segment::new(
            vec![[1.123456789, 2.987654321], [1.2, 2.9]],
            SourceKind::Explicit,
            "COALNE",
        );
        let processed = CoastlineProcessor::default().process_all(&[segment], &[]);
        let reduced = reduce_coordinate_precision(&processed);
        assert_eq!(reduced[0].segment.coordinates[0], [1.123457, 2.987654]);
        assert_eq!(reduced[0].metrics.start, [1.123457, 2.987654]);
        assert_eq!(reduced[0].metrics.length_m, processed[0].metrics.length_m);
    }

    #[test]
    fn test_response_size_estimate() {
        let processed = CoastlineProcessor::default().process_all(&[zigzag()], &[]);
        let estimate = estimate_response_size(&processed);
        assert!(estimate > BYTES_PER_COLLECTION + BYTES_PER_FEATURE + 13 * BYTES_PER_COORDINATE);
        assert_eq!(estimate_response_size(&[]), BYTES_PER_COLLECTION);
    }

    #[test]
    fn test_truncation_keeps_longest() {
        let short = Segment::new(vec![[0.0, 0.0], [0.001, 0.0]], SourceKind::Explicit, "COALNE");
        let long = Segment::new(vec![[1.0, 0.0], [1.1, 0.0]], SourceKind::Explicit, "COALNE");
        let processed = CoastlineProcessor::default().process_all(&[short, long], &[]);

        let everything = truncate_to_budget(&processed, usize::MAX);
        assert_eq!(everything, processed);

        let one = estimate_response_size(&processed[1..]);
        let kept = truncate_to_budget(&processed, one + 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].segment.start(), Some([1.0, 0.0]));

        assert!(truncate_to_budget(&processed, 10).is_empty());
    }
}
