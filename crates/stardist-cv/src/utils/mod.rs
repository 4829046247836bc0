//! Utility modules

pub mod nms;
pub mod normalize;
pub mod raster;

pub use nms::{Contour, MaskSuppressor, SuppressionOutcome};
pub use normalize::{ChannelStretch, PercentileNormalizer};
pub use raster::{count_nonzero, fill_polygon, for_each_polygon_pixel};
