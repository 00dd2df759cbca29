use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    catalog::FeatureCatalog,
    error::{CoastlineError, Result},
    types::FillMethod,
};

/// Complete set of recognised pipeline options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoastlineConfig {
    pub sources: SourceConfig,
    pub stitching: StitchingConfig,
    pub processing: ProcessingOptions,
    pub catalog: FeatureCatalog,
}

/// Which extractors run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SourceConfig {
    pub use_coastlines: bool,
    pub use_depth_areas: bool,
    pub use_land_areas: bool,
    pub use_shoreline_construction: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            use_coastlines: true,
            use_depth_areas: true,
            use_land_areas: true,
            use_shoreline_construction: true,
        }
    }
}

impl SourceConfig {
    /// Only explicit shoreline features
    pub fn explicit_only() -> Self {
        Self {
            use_depth_areas: false,
            use_land_areas: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StitchingConfig {
    pub enabled: bool,
    /// Maximum endpoint separation in meters for two segments to connect
    #[schemars(range(min = 0.0))]
    pub tolerance_m: f64,
    pub gap_filling: GapFillingOptions,
}

impl Default for StitchingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_m: 50.0,
            gap_filling: GapFillingOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GapFillingOptions {
    pub enabled: bool,
    /// Largest gap in meters that may be bridged
    #[schemars(range(min = 0.0))]
    pub max_gap_distance_m: f64,
    pub method: FillMethod,
    /// Reject fills that cut across land polygons
    pub validate_with_water_bodies: bool,
}

impl Default for GapFillingOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_gap_distance_m: 500.0,
            method: FillMethod::Linear,
            validate_with_water_bodies: false,
        }
    }
}

impl GapFillingOptions {
    pub fn enabled(max_gap_distance_m: f64) -> Self {
        Self {
            enabled: true,
            max_gap_distance_m,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_distance("max_gap_distance_m", self.max_gap_distance_m)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimplifyMethod {
    #[default]
    DouglasPeucker,
    VisvalingamWhyatt,
}

/// Post-processing toggles applied to every stitched polyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProcessingOptions {
    pub simplify: bool,
    #[schemars(range(min = 0.0))]
    pub simplify_tolerance_m: f64,
    pub simplify_method: SimplifyMethod,
    pub smooth: bool,
    #[schemars(range(min = 1, max = 20))]
    pub smooth_iterations: usize,
    pub determine_water_side: bool,
    pub reduce_precision: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            simplify: false,
            simplify_tolerance_m: 10.0,
            simplify_method: SimplifyMethod::DouglasPeucker,
            smooth: false,
            smooth_iterations: 1,
            determine_water_side: true,
            reduce_precision: true,
        }
    }
}

impl ProcessingOptions {
    pub fn validate(&self) -> Result<()> {
        check_distance("simplify_tolerance_m", self.simplify_tolerance_m)
    }
}

impl CoastlineConfig {
    /// Precondition check run at the API boundary
    pub fn validate(&self) -> Result<()> {
        if !self.stitching.tolerance_m.is_finite() || self.stitching.tolerance_m < 0.0 {
            return Err(CoastlineError::InvalidTolerance(self.stitching.tolerance_m));
        }
        self.stitching.gap_filling.validate()?;
        self.processing.validate()?;
        if self.catalog.class_key.is_empty() {
            return Err(CoastlineError::invalid("catalog.class_key", "must not be empty"));
        }
        Ok(())
    }

    /// Get the JSON schema of the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CoastlineConfig)
    }
}

fn check_distance(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoastlineError::invalid(
            name,
            format!("{value} is not a finite, non-negative distance in meters"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CoastlineConfig::default();
        config.validate().expect("Default config should validate");
        assert!(config.sources.use_coastlines);
        assert!(!config.stitching.gap_filling.enabled);
        assert_eq!(config.stitching.tolerance_m, 50.0);
    }

    #[test]
    fn test_negative_tolerance_fails_fast() {
        let mut config = CoastlineConfig::default();
        config.stitching.tolerance_m = -1.0;
        assert!(matches!(config.validate(), Err(CoastlineError::InvalidTolerance(_))));
    }

    #[test]
    fn test_non_finite_gap_distance_is_rejected() {
        let mut config = CoastlineConfig::default();
        config.stitching.gap_filling.max_gap_distance_m = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(CoastlineError::InvalidParameter { name: "max_gap_distance_m", .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CoastlineConfig = serde_json::from_str(
            r#"{ "sources": { "use_land_areas": false }, "stitching": { "tolerance_m": 75.0 } }"#,
        )
        .expect("Should parse partial config");
        assert!(!config.sources.use_land_areas);
        assert!(config.sources.use_depth_areas);
        assert_eq!(config.stitching.tolerance_m, 75.0);
        assert_eq!(config.processing.smooth_iterations, 1);
    }

    #[test]
    fn test_schema_names_sections() {
        let schema = serde_json::to_string(&CoastlineConfig::schema()).expect("Should serialize schema");
        assert!(schema.contains("tolerance_m"));
        assert!(schema.contains("use_shoreline_construction"));
    }
}
