use coastline::{CoastlineConfig, CoastlineError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Invalid job configuration: {0}")]
    InvalidConfig(#[from] CoastlineError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One coastline extraction run: where features come from, where results go,
/// and how the pipeline is configured
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExtractionJob {
    pub name: Option<String>,
    /// GeoJSON file of chart features
    pub input_path: String,
    /// GeoJSON file the coastlines are written to
    pub output_path: String,
    /// Optional GeoJSON polygons used as the water mask instead of depth areas
    pub water_polygons_path: Option<String>,
    /// Optional GeoJSON polygons used to validate gap fills instead of land areas
    pub land_polygons_path: Option<String>,
    #[serde(default)]
    pub config: CoastlineConfig,
}

impl ExtractionJob {
    /// Job with default configuration
    pub fn skeleton(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            name: None,
            input_path: input_path.into(),
            output_path: output_path.into(),
            water_polygons_path: None,
            land_polygons_path: None,
            config: CoastlineConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.config.validate()?;
        Ok(())
    }

    /// Get the JSON schema of a job file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractionJob)
    }

    /// Load ExtractionJob from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load ExtractionJob from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load ExtractionJob from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load ExtractionJob from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load the job
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Auto-detect file format and save the job
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml_file(path),
            Some("json") => self.to_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save ExtractionJob to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Convert ExtractionJob to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save ExtractionJob to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Convert ExtractionJob to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_job_uses_defaults() {
        let job = ExtractionJob::from_toml(
            r#"
            input_path = "chart.geojson"
            output_path = "coastlines.geojson"

            [config.stitching]
            tolerance_m = 25.0

            [config.stitching.gap_filling]
            enabled = true
            "#,
        )
        .expect("Should parse TOML job");

        assert_eq!(job.input_path, "chart.geojson");
        assert_eq!(job.config.stitching.tolerance_m, 25.0);
        assert!(job.config.stitching.gap_filling.enabled);
        assert_eq!(job.config.stitching.gap_filling.max_gap_distance_m, 500.0);
        assert!(job.config.sources.use_depth_areas);
        job.validate().expect("Job should validate");
    }

    #[test]
    fn test_skeleton_survives_toml_and_json() {
        let job = ExtractionJob::skeleton("in.geojson", "out.geojson");

        let toml = job.to_toml().expect("Should write TOML");
        assert_eq!(ExtractionJob::from_toml(&toml).expect("Should read TOML"), job);

        let json = job.to_json().expect("Should write JSON");
        assert_eq!(ExtractionJob::from_json(&json).expect("Should read JSON"), job);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            ExtractionJob::from_file("job.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
        let job = ExtractionJob::skeleton("in.geojson", "out.geojson");
        assert!(matches!(job.to_file("job.txt"), Err(CliError::UnsupportedFileFormat)));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut job = ExtractionJob::skeleton("in.geojson", "out.geojson");
        job.config.processing.simplify_tolerance_m = -1.0;
        assert!(matches!(job.validate(), Err(CliError::InvalidConfig(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let job = ExtractionJob {
            name: Some("harbour".to_string()),
            ..ExtractionJob::skeleton("in.geojson", "out.geojson")
        };
        for ext in ["toml", "json"] {
            let path = dir.join(format!("coastline_job_{}.{ext}", std::process::id()));
            job.to_file(&path).expect("Should save job");
            assert_eq!(ExtractionJob::from_file(&path).expect("Should load job"), job);
            let _ = fs::remove_file(&path);
        }
    }

    #[test]
    fn test_schema_mentions_config() {
        let schema = serde_json::to_string(&ExtractionJob::schema()).expect("Should serialize schema");
        assert!(schema.contains("input_path"));
        assert!(schema.contains("tolerance_m"));
    }
}
