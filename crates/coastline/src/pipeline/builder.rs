use geo_types::Polygon;

use crate::{
    catalog::FeatureCatalog,
    config::{CoastlineConfig, GapFillingOptions, SimplifyMethod, SourceConfig},
    pipeline::Pipeline,
};

/// Builder for creating reconstruction pipelines with a fluent API
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: CoastlineConfig,
    water_polygons: Option<Vec<Polygon<f64>>>,
    land_polygons: Option<Vec<Polygon<f64>>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete configuration
    pub fn from_config(config: CoastlineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_sources(mut self, sources: SourceConfig) -> Self {
        self.config.sources = sources;
        self
    }

    pub fn with_catalog(mut self, catalog: FeatureCatalog) -> Self {
        self.config.catalog = catalog;
        self
    }

    /// Endpoint tolerance in meters
    pub fn with_tolerance(mut self, tolerance_m: f64) -> Self {
        self.config.stitching.tolerance_m = tolerance_m;
        self
    }

    pub fn without_stitching(mut self) -> Self {
        self.config.stitching.enabled = false;
        self
    }

    /// Bridge gaps up to `max_gap_distance_m`
    pub fn with_gap_filling(mut self, max_gap_distance_m: f64) -> Self {
        self.config.stitching.gap_filling = GapFillingOptions::enabled(max_gap_distance_m);
        self
    }

    /// Reject gap fills that cross land
    pub fn with_land_validation(mut self) -> Self {
        self.config.stitching.gap_filling.validate_with_water_bodies = true;
        self
    }

    /// Add Douglas-Peucker simplification as a post-processing step
    pub fn with_simplification(mut self, tolerance_m: f64) -> Self {
        self.config.processing.simplify = true;
        self.config.processing.simplify_tolerance_m = tolerance_m;
        self.config.processing.simplify_method = SimplifyMethod::DouglasPeucker;
        self
    }

    /// Add Visvalingam-Whyatt simplification as a post-processing step
    pub fn with_vw_simplification(mut self, tolerance_m: f64) -> Self {
        self.config.processing.simplify = true;
        self.config.processing.simplify_tolerance_m = tolerance_m;
        self.config.processing.simplify_method = SimplifyMethod::VisvalingamWhyatt;
        self
    }

    pub fn with_smoothing(mut self, iterations: usize) -> Self {
        self.config.processing.smooth = true;
        self.config.processing.smooth_iterations = iterations;
        self
    }

    /// Use these polygons as the water mask instead of the batch's depth areas
    pub fn with_water_polygons(mut self, polygons: Vec<Polygon<f64>>) -> Self {
        self.water_polygons = Some(polygons);
        self
    }

    /// Use these polygons as the land mask instead of the batch's land areas
    pub fn with_land_polygons(mut self, polygons: Vec<Polygon<f64>>) -> Self {
        self.land_polygons = Some(polygons);
        self
    }

    pub fn without_water_side(mut self) -> Self {
        self.config.processing.determine_water_side = false;
        self
    }

    pub fn keep_full_precision(mut self) -> Self {
        self.config.processing.reduce_precision = false;
        self
    }

    /// Build the pipeline. Configuration is validated when it runs.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.config, self.water_polygons, self.land_polygons)
    }

    /// Explicit shoreline features only, no gap filling
    pub fn build_explicit_only(tolerance_m: f64) -> Pipeline {
        Self::new()
            .with_sources(SourceConfig::explicit_only())
            .with_tolerance(tolerance_m)
            .build()
    }

    /// Every source, land-validated gap filling, simplification and smoothing
    pub fn build_comprehensive(tolerance_m: f64, max_gap_distance_m: f64, simplify_tolerance_m: f64) -> Pipeline {
        Self::new()
            .with_tolerance(tolerance_m)
            .with_gap_filling(max_gap_distance_m)
            .with_land_validation()
            .with_simplification(simplify_tolerance_m)
            .with_smoothing(1)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_options() {
        let pipeline = PipelineBuilder::new()
            .with_tolerance(25.0)
            .with_gap_filling(300.0)
            .with_vw_simplification(5.0)
            .with_smoothing(3)
            .build();

        let config = pipeline.config();
        assert_eq!(config.stitching.tolerance_m, 25.0);
        assert!(config.stitching.gap_filling.enabled);
        assert_eq!(config.stitching.gap_filling.max_gap_distance_m, 300.0);
        assert_eq!(config.processing.simplify_method, SimplifyMethod::VisvalingamWhyatt);
        assert_eq!(config.processing.smooth_iterations, 3);
        assert!(pipeline.info().contains("gap filling on"));
    }

    #[test]
    fn test_presets() {
        let explicit = PipelineBuilder::build_explicit_only(10.0);
        assert!(!explicit.config().sources.use_depth_areas);
        assert!(!explicit.config().stitching.gap_filling.enabled);

        let comprehensive = PipelineBuilder::build_comprehensive(50.0, 500.0, 10.0);
        let config = comprehensive.config();
        assert!(config.stitching.gap_filling.validate_with_water_bodies);
        assert!(config.processing.simplify);
        assert!(config.processing.smooth);
        config.validate().expect("Preset should validate");
    }

    #[test]
    fn test_invalid_builder_settings_fail_on_run() {
        let pipeline = PipelineBuilder::new().with_gap_filling(f64::INFINITY).build();
        assert!(pipeline.process(&[]).is_err());
    }
}
