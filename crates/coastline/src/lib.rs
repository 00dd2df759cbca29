//! # Coastline Reconstruction Library
//!
//! Rebuilds continuous, annotated shoreline polylines from nautical chart
//! vector features. Charts digitize a shoreline as many disconnected pieces;
//! this crate extracts them, stitches pieces whose endpoints meet, bridges
//! small gaps, and annotates every result with provenance, metrics and the
//! side of the line that is water.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: extractors, gap-fill validators, simplifiers
//!   and smoothers are traits with default implementations
//! - **Pipeline System**: one configurable pass from raw features to output
//! - **Provenance**: every segment keeps the set of feature classes it came from
//! - **GeoJSON Support**: GeoJSON in, typed GeoJSON out
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coastline::{Pipeline, io::load_features_from_file};
//!
//! let features = load_features_from_file("chart.geojson")?;
//! let result = Pipeline::builder()
//!     .with_tolerance(50.0)
//!     .with_gap_filling(500.0)
//!     .build()
//!     .process(&features)?;
//!
//! result.save_geojson("coastlines.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod geometry;
pub mod types;
pub mod catalog;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod manager;
pub mod mcp;
pub mod typed_geojson;

// Re-exports for convenience
pub use error::{CoastlineError, Result};
pub use types::{AnnotatedCoastline, CoastlineResult, Gap, ProcessingStats, Segment, SubType, WaterSide};
pub use catalog::FeatureCatalog;
pub use config::CoastlineConfig;
pub use traits::*;
pub use algorithms::{CoastlineExtractor, CoastlineProcessor, CoastlineStitcher};
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use manager::{CoastlineCommand, CoastlineManager, CommandOutput};
