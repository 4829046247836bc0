//! StarDist post-processing library
//!
//! Turns per-pixel ray-distance predictions into star-convex polygons, prunes
//! overlaps with a greedy mask suppressor and scores the resulting instance
//! masks against ground truth.

pub mod detection;
pub mod metric;
pub mod polygon;
pub mod utils;

// Re-export commonly used types
pub use detection::{InstanceSegmenter, RayAngles, RayPrediction, SegmentationResult, StarPolygonReconstructor};
pub use metric::{DiceMetric, DiceScorer, dice};
pub use polygon::{BoundingBox, Candidate, CandidateCollection, Point};
pub use utils::{MaskSuppressor, PercentileNormalizer};

// Error handling
pub use stardist_core::{Result, StardistError};

/// Seams between the post-processing core and its callers
pub mod traits {
    use super::*;
    use ndarray::{ArrayView2, ArrayView4};

    /// Overlap suppression over candidate polygons on a `height x width` tile
    pub trait OverlapSuppression {
        /// Positions of the surviving candidates, in processing order
        fn suppress(&self, candidates: &[Candidate], height: usize, width: usize) -> Vec<usize>;
    }

    /// Accuracy metric driven by an external calibration harness
    pub trait Metric {
        fn name(&self) -> &str;
        /// Score one raw network output against its annotation
        fn update(&mut self, output: ArrayView4<'_, f32>, annotation: ArrayView2<'_, u8>) -> Result<f64>;
        /// Score of the most recent output
        fn value(&self) -> Option<f64>;
        /// Mean score since the last reset
        fn avg_value(&self) -> Option<f64>;
        fn reset(&mut self);
        fn higher_better(&self) -> bool {
            true
        }
    }
}
