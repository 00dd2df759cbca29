pub mod builder;

use geo_types::Polygon;
use geojson::Feature;
use tracing::{debug, info};

use crate::{
    algorithms::{
        classify_segments, deduplicate_segments, extraction::exterior_rings, reduce_coordinate_precision,
        CoastlineExtractor, CoastlineProcessor, CoastlineStitcher, LandMaskValidator,
    },
    catalog::FeatureCatalog,
    config::CoastlineConfig,
    error::Result,
    geometry::{polygon_from_ring, METERS_PER_NAUTICAL_MILE},
    types::{AnnotatedCoastline, CoastlineResult, Gap, ProcessingStats, Segment},
};

/// Extraction, stitching and post-processing of one chart feature batch
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: CoastlineConfig,
    water_polygons: Option<Vec<Polygon<f64>>>,
    land_polygons: Option<Vec<Polygon<f64>>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        config: CoastlineConfig,
        water_polygons: Option<Vec<Polygon<f64>>>,
        land_polygons: Option<Vec<Polygon<f64>>>,
    ) -> Self {
        Self {
            config,
            water_polygons,
            land_polygons,
        }
    }

    /// Pipeline with no caller-supplied polygons
    pub fn from_config(config: CoastlineConfig) -> Self {
        Self::new(config, None, None)
    }

    pub fn config(&self) -> &CoastlineConfig {
        &self.config
    }

    /// Run the full reconstruction over a feature batch
    pub fn process(&self, features: &[Feature]) -> Result<CoastlineResult> {
        self.config.validate()?;
        let catalog = &self.config.catalog;

        // Step 1: Extract and collapse duplicates
        let extractor = CoastlineExtractor::new(catalog.clone());
        let raw = extractor.extract_all_raw(features, &self.config.sources);
        let segments_extracted = raw.len();
        let segments = deduplicate_segments(raw);
        let segments_after_dedup = segments.len();

        // Step 2: Stitch, bridging gaps when enabled
        let stitcher = self.stitcher_for(features)?;
        let stitched = if self.config.stitching.enabled {
            stitcher.stitch_segments(&segments, Some(&self.config.stitching.gap_filling))?
        } else {
            segments
        };

        // Step 3: Classify the merged geometry
        let classified = classify_segments(&stitched, catalog.into());

        // Step 4: Gaps still open after stitching
        let gaps = stitcher.detect_gaps(&classified);

        // Step 5: Simplify, smooth, measure and orient
        let processor = CoastlineProcessor::new(self.config.processing.clone())?;
        let water = self.water_polygons_for(features);
        let mut coastlines = processor.process_all(&classified, &water);
        if self.config.processing.reduce_precision {
            coastlines = reduce_coordinate_precision(&coastlines);
        }

        let stats = compute_stats(segments_extracted, segments_after_dedup, &coastlines, &gaps);
        info!(
            extracted = stats.segments_extracted,
            coastlines = stats.segments_after_stitching,
            gaps_filled = stats.gaps_filled,
            gaps_open = stats.gaps_detected,
            length_nm = stats.total_length_nm,
            "coastline reconstruction finished"
        );

        Ok(CoastlineResult {
            coastlines,
            gaps,
            stats,
        })
    }

    /// Extract and stitch without filling, then report every gap
    pub fn detect_gaps(&self, features: &[Feature]) -> Result<Vec<Gap>> {
        self.config.validate()?;
        let extractor = CoastlineExtractor::new(self.config.catalog.clone());
        let segments = extractor.extract_all_coastlines(features, &self.config.sources);
        let stitcher = CoastlineStitcher::new(self.config.stitching.tolerance_m)?;
        let stitched: Vec<Segment> = if self.config.stitching.enabled {
            stitcher.stitch_segments(&segments, None)?
        } else {
            segments
        };
        let gaps = stitcher.detect_gaps(&stitched);
        debug!(segments = stitched.len(), gaps = gaps.len(), "detected gaps");
        Ok(gaps)
    }

    fn stitcher_for(&self, features: &[Feature]) -> Result<CoastlineStitcher> {
        let stitcher = CoastlineStitcher::new(self.config.stitching.tolerance_m)?;
        let gap_filling = &self.config.stitching.gap_filling;
        if !(gap_filling.enabled && gap_filling.validate_with_water_bodies) {
            return Ok(stitcher);
        }

        let land = match &self.land_polygons {
            Some(land) => land.clone(),
            None => land_polygons_from_features(features, &self.config.catalog),
        };
        debug!(land_polygons = land.len(), "validating gap fills against land");
        Ok(stitcher.with_validator(LandMaskValidator::new(land)))
    }

    fn water_polygons_for(&self, features: &[Feature]) -> Vec<Polygon<f64>> {
        if !self.config.processing.determine_water_side {
            return Vec::new();
        }
        match &self.water_polygons {
            Some(water) => water.clone(),
            None => water_polygons_from_features(features, &self.config.catalog),
        }
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let config = &self.config;
        format!(
            "Pipeline: stitching {} (tolerance {} m), gap filling {} (max {} m), simplify {}, smooth {}, {} water polygons",
            on_off(config.stitching.enabled),
            config.stitching.tolerance_m,
            on_off(config.stitching.gap_filling.enabled),
            config.stitching.gap_filling.max_gap_distance_m,
            on_off(config.processing.simplify),
            on_off(config.processing.smooth),
            self.water_polygons.as_ref().map_or("derived".to_string(), |w| w.len().to_string()),
        )
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn class_polygons(features: &[Feature], catalog: &FeatureCatalog, class: &str) -> Vec<Polygon<f64>> {
    features
        .iter()
        .filter(|feature| catalog.feature_class(feature) == Some(class))
        .flat_map(exterior_rings)
        .filter(|ring| ring.len() >= 4)
        .map(|ring| polygon_from_ring(&ring))
        .collect()
}

/// Depth-area polygons of a batch, used as the water mask
pub fn water_polygons_from_features(features: &[Feature], catalog: &FeatureCatalog) -> Vec<Polygon<f64>> {
    class_polygons(features, catalog, &catalog.depth_area_class)
}

/// Land-area polygons of a batch, used to validate gap fills
pub fn land_polygons_from_features(features: &[Feature], catalog: &FeatureCatalog) -> Vec<Polygon<f64>> {
    class_polygons(features, catalog, &catalog.land_area_class)
}

fn compute_stats(
    segments_extracted: usize,
    segments_after_dedup: usize,
    coastlines: &[AnnotatedCoastline],
    gaps: &[Gap],
) -> ProcessingStats {
    let mut stats = ProcessingStats {
        segments_extracted,
        segments_after_dedup,
        segments_after_stitching: coastlines.len(),
        gaps_detected: gaps.len(),
        ..ProcessingStats::default()
    };

    for coastline in coastlines {
        let length_m = coastline.metrics.length_m;
        stats.gaps_filled += coastline.segment.gap_count;
        stats.total_length_m += length_m;
        if coastline.continuous {
            stats.continuous_count += 1;
        }
        for class in &coastline.segment.source_features {
            let source = stats.by_source.entry(class.clone()).or_default();
            source.count += 1;
            source.length_m += length_m;
        }
    }
    stats.total_length_nm = stats.total_length_m / METERS_PER_NAUTICAL_MILE;
    stats
}
