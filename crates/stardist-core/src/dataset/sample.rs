//! Loaded tiles and their conversion into arrays

use anyhow::Context;
use image::{DynamicImage, GenericImageView};
use ndarray::{Array2, Array3};

/// One dataset tile, optionally paired with its ground truth
#[derive(Debug, Clone)]
pub struct Sample {
    pub index: usize,
    pub name: String,
    /// Intensities in (H, W, C) layout.
    pub image: Array3<f32>,
    /// Binary ground truth, nonzero pixels set to 255.
    pub mask: Option<Array2<u8>>,
}

impl Sample {
    /// (height, width) of the tile
    pub fn spatial_size(&self) -> (usize, usize) {
        let shape = self.image.shape();
        (shape[0], shape[1])
    }

    pub fn channels(&self) -> usize {
        self.image.shape()[2]
    }
}

/// Convert an image into an (H, W, C) float array.
///
/// Single-channel sources (with or without alpha) keep one channel, anything
/// else is reduced to RGB.
pub fn image_to_array(image: &DynamicImage) -> anyhow::Result<Array3<f32>> {
    let (width, height) = image.dimensions();
    let (channels, raw) = if image.color().channel_count() <= 2 {
        (1, image.to_luma8().into_raw())
    } else {
        (3, image.to_rgb8().into_raw())
    };

    Array3::from_shape_vec(
        (height as usize, width as usize, channels),
        raw.into_iter().map(f32::from).collect(),
    )
    .context("Failed to build image array")
}

/// Convert a label or binary image into a binary `u8` raster.
pub fn mask_to_array(mask: &DynamicImage) -> anyhow::Result<Array2<u8>> {
    let (width, height) = mask.dimensions();
    let raw = mask
        .to_luma16()
        .into_raw()
        .into_iter()
        .map(|v| if v != 0 { 255 } else { 0 })
        .collect();

    Array2::from_shape_vec((height as usize, width as usize), raw)
        .context("Failed to build mask array")
}
