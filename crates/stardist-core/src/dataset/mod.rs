//! Tile dataset used to feed calibration and evaluation

pub mod loader;
pub mod sample;

pub use loader::TileDataset;
pub use sample::{Sample, image_to_array, mask_to_array};
