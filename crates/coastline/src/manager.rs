use std::{path::Path, sync::Arc};

use geojson::Feature;
use crate::{
    config::{CoastlineConfig, GapFillingOptions},
    error::{CoastlineError, Result},
    io::{features_from_geojson_str, load_features_from_file},
    pipeline::Pipeline,
    types::{CoastlineResult, Gap},
};
use serde::{Serialize, Deserialize};
use schemars::JsonSchema;
use strum::{Display, EnumString, EnumIter, IntoStaticStr, VariantNames};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum CoastlineCommand {
    /// Extract and stitch coastlines with the base configuration
    #[serde(rename = "extract_coastlines")]
    ExtractCoastlines,

    /// Extract coastlines with Douglas-Peucker simplification
    #[serde(rename = "extract_coastlines_with_simplification")]
    ExtractCoastlinesWithSimplification {
        #[schemars(range(min = 0.0, max = 10000.0))]
        tolerance_m: f64,
    },

    /// Extract coastlines with weighted moving-average smoothing
    #[serde(rename = "extract_coastlines_with_smoothing")]
    ExtractCoastlinesWithSmoothing {
        #[schemars(range(min = 1, max = 20))]
        iterations: usize,
    },

    /// Extract coastlines and bridge small digitization gaps
    #[serde(rename = "extract_coastlines_with_gap_filling")]
    ExtractCoastlinesWithGapFilling {
        #[schemars(range(min = 0.0, max = 50000.0))]
        max_gap_distance_m: f64,
    },

    /// Report gaps left between stitched coastlines
    #[serde(rename = "detect_gaps")]
    DetectGaps,
}

impl CoastlineCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CoastlineCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// One example of every command
    pub fn examples() -> Vec<Self> {
        vec![
            Self::ExtractCoastlines,
            Self::ExtractCoastlinesWithSimplification { tolerance_m: 10.0 },
            Self::ExtractCoastlinesWithSmoothing { iterations: 2 },
            Self::ExtractCoastlinesWithGapFilling { max_gap_distance_m: 500.0 },
            Self::DetectGaps,
        ]
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::ExtractCoastlines => "Extract, stitch and annotate coastlines from the loaded chart features",
            Self::ExtractCoastlinesWithSimplification { .. } => "Extract coastlines and simplify them to reduce point count",
            Self::ExtractCoastlinesWithSmoothing { .. } => "Extract coastlines and smooth their interior points",
            Self::ExtractCoastlinesWithGapFilling { .. } => "Extract coastlines and bridge gaps up to a maximum distance",
            Self::DetectGaps => "List unconnected endpoint pairs left after stitching",
        }
    }

    /// Get parameter requirements for the command
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::ExtractCoastlines | Self::DetectGaps => vec![],
            Self::ExtractCoastlinesWithSimplification { .. } => vec![
                ("tolerance_m", "Simplification tolerance in meters (higher = more simplified)", true)
            ],
            Self::ExtractCoastlinesWithSmoothing { .. } => vec![
                ("iterations", "Number of smoothing passes (1-20)", true)
            ],
            Self::ExtractCoastlinesWithGapFilling { .. } => vec![
                ("max_gap_distance_m", "Largest gap in meters that may be bridged", true)
            ],
        }
    }

    /// Base configuration with this command's overrides applied
    pub fn apply(&self, base: &CoastlineConfig) -> CoastlineConfig {
        let mut config = base.clone();
        match *self {
            Self::ExtractCoastlines | Self::DetectGaps => {}
            Self::ExtractCoastlinesWithSimplification { tolerance_m } => {
                config.processing.simplify = true;
                config.processing.simplify_tolerance_m = tolerance_m;
            }
            Self::ExtractCoastlinesWithSmoothing { iterations } => {
                config.processing.smooth = true;
                config.processing.smooth_iterations = iterations;
            }
            Self::ExtractCoastlinesWithGapFilling { max_gap_distance_m } => {
                config.stitching.gap_filling = GapFillingOptions {
                    validate_with_water_bodies: base.stitching.gap_filling.validate_with_water_bodies,
                    ..GapFillingOptions::enabled(max_gap_distance_m)
                };
            }
        }
        config
    }
}

/// Result of executing a [`CoastlineCommand`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Coastlines(CoastlineResult),
    Gaps(Vec<Gap>),
}

/// Holds a loaded chart feature batch and runs commands against it
#[derive(Debug, Clone, Default)]
pub struct CoastlineManager {
    features: Option<Arc<Vec<Feature>>>,
    config: CoastlineConfig,
}

impl CoastlineManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new CoastlineManager with a custom base configuration
    pub fn with_config(config: CoastlineConfig) -> Self {
        Self {
            features: None,
            config,
        }
    }

    pub fn config(&self) -> &CoastlineConfig {
        &self.config
    }

    /// Load chart features from a GeoJSON file, returning how many were read
    pub fn load_features(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let features = load_features_from_file(path)?;
        Ok(self.set_features(features))
    }

    /// Load chart features from a GeoJSON string
    pub fn load_features_from_str(&mut self, geojson: &str) -> Result<usize> {
        let features = features_from_geojson_str(geojson)?;
        Ok(self.set_features(features))
    }

    /// Set the feature batch directly
    pub fn set_features(&mut self, features: Vec<Feature>) -> usize {
        let count = features.len();
        self.features = Some(Arc::new(features));
        count
    }

    pub fn feature_count(&self) -> usize {
        self.features.as_ref().map_or(0, |features| features.len())
    }

    pub fn execute(&self, command: CoastlineCommand) -> Result<CommandOutput> {
        let features = self.features.as_ref().ok_or(CoastlineError::NoFeaturesLoaded)?;
        let pipeline = Pipeline::from_config(command.apply(&self.config));

        match command {
            CoastlineCommand::DetectGaps => pipeline.detect_gaps(features).map(CommandOutput::Gaps),
            _ => pipeline.process(features).map(CommandOutput::Coastlines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const BATCH: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"_featureType":"COALNE"},
         "geometry":{"type":"LineString","coordinates":[[0,0],[0.001,0]]}},
        {"type":"Feature","properties":{"_featureType":"COALNE"},
         "geometry":{"type":"LineString","coordinates":[[0.002,0],[0.003,0]]}},
        {"type":"Feature","properties":{"_featureType":"SLCONS","CATSLC":"6"},
         "geometry":{"type":"LineString","coordinates":[[1,1],[1.001,1]]}}
    ]}"#;

    fn loaded() -> CoastlineManager {
        let mut manager = CoastlineManager::new();
        let count = manager.load_features_from_str(BATCH).expect("Should load features");
        assert_eq!(count, 3);
        manager
    }

    #[test]
    fn test_execute_without_features_fails() {
        let manager = CoastlineManager::new();
        assert!(matches!(
            manager.execute(CoastlineCommand::ExtractCoastlines),
            Err(CoastlineError::NoFeaturesLoaded)
        ));
    }

    #[test]
    fn test_extract_coastlines() {
        let output = loaded().execute(CoastlineCommand::ExtractCoastlines).expect("Should execute");
        let CommandOutput::Coastlines(result) = output else {
            panic!("Expected coastlines");
        };
        assert_eq!(result.len(), 3);
        assert_eq!(result.coastlines_of(crate::types::SubType::Pier).count(), 1);
    }

    #[test]
    fn test_gap_filling_command() {
        let output = loaded()
            .execute(CoastlineCommand::ExtractCoastlinesWithGapFilling { max_gap_distance_m: 500.0 })
            .expect("Should execute");
        let CommandOutput::Coastlines(result) = output else {
            panic!("Expected coastlines");
        };
        assert_eq!(result.len(), 2);
        assert_eq!(result.stats.gaps_filled, 1);
    }

    #[test]
    fn test_detect_gaps_command() {
        let output = loaded().execute(CoastlineCommand::DetectGaps).expect("Should execute");
        let CommandOutput::Gaps(gaps) = output else {
            panic!("Expected gaps");
        };
        assert!(!gaps.is_empty());
        assert!(gaps.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_command_serde_and_names() {
        let command: CoastlineCommand = serde_json::from_str(
            r#"{"type":"extract_coastlines_with_smoothing","params":{"iterations":3}}"#,
        )
        .expect("Should parse command");
        assert_eq!(command, CoastlineCommand::ExtractCoastlinesWithSmoothing { iterations: 3 });
        assert_eq!(command.to_string(), "extract_coastlines_with_smoothing");
        assert!(CoastlineCommand::command_names().contains(&"detect_gaps"));
        assert_eq!(CoastlineCommand::from_str("detect_gaps").expect("Should parse name"), CoastlineCommand::DetectGaps);
        assert_eq!(CoastlineCommand::examples().len(), CoastlineCommand::command_names().len());
    }

    #[test]
    fn test_apply_overrides() {
        let base = CoastlineConfig::default();
        let config = CoastlineCommand::ExtractCoastlinesWithSimplification { tolerance_m: 25.0 }.apply(&base);
        assert!(config.processing.simplify);
        assert_eq!(config.processing.simplify_tolerance_m, 25.0);
        assert_eq!(CoastlineCommand::DetectGaps.apply(&base), base);
    }
}
