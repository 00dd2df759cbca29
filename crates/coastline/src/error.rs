use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoastlineError {
    #[error("Invalid stitching tolerance: {0} (must be a finite, non-negative distance in meters)")]
    InvalidTolerance(f64),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("No chart features loaded")]
    NoFeaturesLoaded,

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl CoastlineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoastlineError>;
