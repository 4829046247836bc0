//! Typed configuration for post-processing, normalization and dataset loading

use crate::error::{Result, StardistError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Star-polygon reconstruction and suppression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    pub n_rays: usize,
    pub confidence_threshold: f32,
    pub nms_threshold: f64,
    pub foreground_value: u8,
}

/// Percentile contrast stretch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub num_bins: usize,
}

/// Where tiles come from and how they are cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub images_dir: PathBuf,
    /// Ground-truth directory; `None` switches to random-crop mode.
    #[serde(default)]
    pub masks_dir: Option<PathBuf>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Everything an evaluation run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub postprocess: PostprocessConfig,
}

fn default_tile_size() -> u32 {
    256
}

fn default_extensions() -> Vec<String> {
    ["tif", "tiff", "png", "jpg", "jpeg", "bmp"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            n_rays: 32,
            confidence_threshold: 0.7,
            nms_threshold: 0.5,
            foreground_value: 255,
        }
    }
}

impl PostprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_rays < 3 {
            return Err(StardistError::config(format!(
                "n_rays must be at least 3, got {}",
                self.n_rays
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(StardistError::config(format!(
                "confidence_threshold must lie in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.nms_threshold) {
            return Err(StardistError::config(format!(
                "nms_threshold must lie in [0, 1], got {}",
                self.nms_threshold
            )));
        }
        if self.foreground_value == 0 {
            return Err(StardistError::config("foreground_value must be nonzero"));
        }
        Ok(())
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            lower_percentile: 1.0,
            upper_percentile: 99.0,
            num_bins: 256,
        }
    }
}

impl NormalizationConfig {
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = (self.lower_percentile, self.upper_percentile);
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo >= hi {
            return Err(StardistError::config(format!(
                "percentiles must satisfy 0 <= lower < upper <= 100, got ({lo}, {hi})"
            )));
        }
        if self.num_bins < 2 {
            return Err(StardistError::config(format!(
                "num_bins must be at least 2, got {}",
                self.num_bins
            )));
        }
        Ok(())
    }
}

impl DatasetConfig {
    /// Paired images/masks layout used for accuracy-aware calibration.
    pub fn paired<P: AsRef<Path>, Q: AsRef<Path>>(images_dir: P, masks_dir: Q) -> Self {
        Self {
            images_dir: images_dir.as_ref().to_path_buf(),
            masks_dir: Some(masks_dir.as_ref().to_path_buf()),
            tile_size: default_tile_size(),
            seed: None,
            extensions: default_extensions(),
        }
    }

    /// Images only; tiles are cropped at random.
    pub fn cropped<P: AsRef<Path>>(images_dir: P) -> Self {
        Self {
            images_dir: images_dir.as_ref().to_path_buf(),
            masks_dir: None,
            tile_size: default_tile_size(),
            seed: None,
            extensions: default_extensions(),
        }
    }

    pub fn has_ground_truth(&self) -> bool {
        self.masks_dir.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(StardistError::config("tile_size must be positive"));
        }
        if self.images_dir.as_os_str().is_empty() {
            return Err(StardistError::config("images_dir must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(StardistError::config("at least one image extension is required"));
        }
        Ok(())
    }
}

impl EvaluationConfig {
    pub fn new(dataset: DatasetConfig) -> Result<Self> {
        let config = Self {
            dataset,
            normalization: NormalizationConfig::default(),
            postprocess: PostprocessConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;
        self.normalization.validate()?;
        self.postprocess.validate()
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PostprocessConfig::default().validate().is_ok());
        assert!(NormalizationConfig::default().validate().is_ok());
        assert!(DatasetConfig::paired("img", "masks").validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let config = PostprocessConfig {
            nms_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StardistError::Config { .. })));

        let config = NormalizationConfig {
            lower_percentile: 99.0,
            upper_percentile: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_fills_defaults() {
        let json = r#"{ "dataset": { "images_dir": "train/images", "masks_dir": "train/masks" } }"#;
        let config: EvaluationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.dataset.tile_size, 256);
        assert!(config.dataset.has_ground_truth());
        assert_eq!(config.postprocess, PostprocessConfig::default());
        assert_eq!(config.normalization.num_bins, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "dataset": { "images_dir": "x", "tile_size": 0 } }"#,
        )
        .unwrap();

        assert!(EvaluationConfig::from_json_file(&path).is_err());
    }
}
