//! Calibration-side data path: tiles in, normalized network inputs out

use anyhow::Context;
use ndarray::{Array2, Array4, Axis};
use serde::Serialize;
use stardist_core::{DatasetConfig, EvaluationConfig, NormalizationConfig, TileDataset};
use stardist_cv::{DiceMetric, PercentileNormalizer};

/// One item handed to the calibration harness
#[derive(Debug, Clone)]
pub struct CalibrationItem {
    pub index: usize,
    pub name: String,
    /// Ground truth when the dataset is paired.
    pub annotation: Option<Array2<u8>>,
    /// Normalized tile in NCHW layout `(1, C, H, W)`.
    pub input: Array4<f32>,
    pub stretch: SampleStretch,
}

/// Normalization applied to one item, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct SampleStretch {
    pub name: String,
    pub lower_bins: Vec<usize>,
    pub upper_bins: Vec<usize>,
}

/// Tile dataset plus percentile normalization
pub struct CalibrationLoader {
    dataset: TileDataset,
    normalizer: PercentileNormalizer,
}

impl CalibrationLoader {
    pub fn new(dataset: &DatasetConfig, normalization: NormalizationConfig) -> anyhow::Result<Self> {
        Ok(Self {
            dataset: TileDataset::open(dataset)?,
            normalizer: PercentileNormalizer::new(normalization)?,
        })
    }

    pub fn from_config(config: &EvaluationConfig) -> anyhow::Result<Self> {
        Self::new(&config.dataset, config.normalization.clone())
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn get(&mut self, index: usize) -> anyhow::Result<CalibrationItem> {
        let sample = self.dataset.load(index)?;
        let stretch = self
            .normalizer
            .compute(sample.image.view())
            .with_context(|| format!("Failed to normalize {}", sample.name))?;
        let normalized = stretch.apply(sample.image.view())?;

        // (H, W, C) -> (1, C, H, W)
        let input = normalized
            .permuted_axes([2, 0, 1])
            .as_standard_layout()
            .into_owned()
            .insert_axis(Axis(0));

        Ok(CalibrationItem {
            index,
            stretch: SampleStretch {
                name: sample.name.clone(),
                lower_bins: stretch.lower_bins,
                upper_bins: stretch.upper_bins,
            },
            name: sample.name,
            annotation: sample.mask,
            input,
        })
    }
}

/// Metric to hand to the harness; `None` when there is no ground truth
pub fn accuracy_metric(config: &EvaluationConfig) -> anyhow::Result<Option<DiceMetric>> {
    if !config.dataset.has_ground_truth() {
        return Ok(None);
    }
    Ok(Some(DiceMetric::new(config.postprocess.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_items_are_nchw() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let masks = root.path().join("masks");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&masks).unwrap();

        let tile = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 16 + y) as u8]));
        tile.save(images.join("t.png")).unwrap();
        GrayImage::from_pixel(16, 16, Luma([1])).save(masks.join("t.png")).unwrap();

        let mut dataset = DatasetConfig::paired(&images, &masks);
        dataset.tile_size = 16;
        let config = EvaluationConfig::new(dataset).unwrap();

        let mut loader = CalibrationLoader::from_config(&config).unwrap();
        assert_eq!(loader.len(), 1);

        let item = loader.get(0).unwrap();
        assert_eq!(item.input.shape(), &[1, 1, 16, 16]);
        assert!(item.annotation.is_some());
        assert!(item.stretch.upper_bins[0] > item.stretch.lower_bins[0]);
        assert!(accuracy_metric(&config).unwrap().is_some());
    }
}
