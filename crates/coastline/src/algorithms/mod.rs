pub mod extraction;
pub mod classification;
pub mod stitching;
pub mod gaps;
pub mod simplification;
pub mod water_side;
pub mod metrics;
pub mod processor;

pub use extraction::*;
pub use classification::*;
pub use stitching::*;
pub use gaps::*;
pub use simplification::*;
pub use water_side::*;
pub use metrics::*;
pub use processor::*;
