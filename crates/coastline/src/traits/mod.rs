use geojson::Feature;

use crate::{
    catalog::FeatureCatalog,
    types::{Gap, Segment, SubType},
};

/// Trait for turning one family of chart features into shoreline segments
pub trait SegmentExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extract segments from the features this extractor recognises.
    /// Malformed features are skipped, never reported as errors.
    fn extract(&self, features: &[Feature], catalog: &FeatureCatalog) -> Vec<Segment>;
}

/// Trait for resolving a shoreline-construction category code to a subtype
pub trait CategoryLookup: Send + Sync {
    fn subtype_for(&self, category: u32) -> Option<SubType>;
}

/// Trait for accepting or rejecting synthesized gap-filling geometry
pub trait GapFillValidator: Send + Sync {
    /// `fill` holds the interpolated points, gap endpoints included
    fn accept(&self, gap: &Gap, fill: &[[f64; 2]]) -> bool;
}

/// Trait for vertex-reduction algorithms.
/// Implementations must keep the first and last coordinate untouched.
pub trait SegmentSimplifier: Send + Sync {
    fn simplify(&self, segment: &Segment, tolerance_m: f64) -> Segment;
}

/// Trait for smoothing algorithms.
/// Implementations must keep the first and last coordinate untouched.
pub trait SegmentSmoother: Send + Sync {
    fn smooth(&self, segment: &Segment, iterations: usize) -> Segment;
}
