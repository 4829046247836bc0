//! From raw network output to instance masks

pub mod angles;
pub mod prediction;
pub mod reconstructor;
pub mod segmenter;

pub use angles::RayAngles;
pub use prediction::RayPrediction;
pub use reconstructor::StarPolygonReconstructor;
pub use segmenter::{InstanceSegmenter, SegmentationResult, SegmentationStats};
