//! Shared data model for StarDist post-processing: errors, configuration and
//! the tile dataset.

pub mod config;
pub mod dataset;
pub mod error;

pub use config::{DatasetConfig, EvaluationConfig, NormalizationConfig, PostprocessConfig};
pub use dataset::{Sample, TileDataset};
pub use error::{Result, StardistError};
