//! Tile dataset loading with paired and random-crop modes

use super::sample::{Sample, image_to_array, mask_to_array};
use crate::config::DatasetConfig;
use crate::error::StardistError;
use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct TileEntry {
    name: String,
    image: PathBuf,
    mask: Option<PathBuf>,
}

/// Image tiles read from a directory, matched to masks by filename
pub struct TileDataset {
    entries: Vec<TileEntry>,
    tile_size: u32,
    rng: StdRng,
}

impl TileDataset {
    /// Scan the configured directories and keep the usable files
    pub fn open(config: &DatasetConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let mut names = Self::list_images(&config.images_dir, &config.extensions)?;
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let image = config.images_dir.join(&name);
            let (width, height) = image::image_dimensions(&image)
                .with_context(|| format!("Failed to read image header: {:?}", image))?;

            match &config.masks_dir {
                Some(masks_dir) => {
                    if width != config.tile_size || height != config.tile_size {
                        warn!("skipping {name}: {width}x{height} is not a full tile");
                        continue;
                    }
                    let mask = masks_dir.join(&name);
                    if !mask.exists() {
                        warn!("skipping {name}: no mask at {:?}", mask);
                        continue;
                    }
                    entries.push(TileEntry {
                        name,
                        image,
                        mask: Some(mask),
                    });
                }
                None => {
                    if width < config.tile_size || height < config.tile_size {
                        warn!("skipping {name}: {width}x{height} is smaller than one tile");
                        continue;
                    }
                    entries.push(TileEntry {
                        name,
                        image,
                        mask: None,
                    });
                }
            }
        }

        info!(
            "Loaded {} tiles from {:?} ({})",
            entries.len(),
            config.images_dir,
            if config.has_ground_truth() { "paired" } else { "random crop" }
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            entries,
            tile_size: config.tile_size,
            rng,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.name.as_str())
    }

    /// Load one tile. In crop mode every call draws a new random window.
    pub fn load(&mut self, index: usize) -> anyhow::Result<Sample> {
        let entry = self
            .entries
            .get(index)
            .with_context(|| format!("Sample index {} out of range ({})", index, self.len()))?
            .clone();

        let mut img = image::open(&entry.image)
            .with_context(|| format!("Failed to open image: {:?}", entry.image))?;

        let mask = match &entry.mask {
            Some(path) => {
                let mask = image::open(path)
                    .with_context(|| format!("Failed to open mask: {:?}", path))?;
                let mask = mask_to_array(&mask)?;
                let tile = self.tile_size as usize;
                if mask.dim() != (tile, tile) {
                    return Err(StardistError::shape_mismatch((tile, tile), mask.dim()).into());
                }
                Some(mask)
            }
            None => {
                let tile = self.tile_size;
                let x = self.rng.gen_range(0..=img.width() - tile);
                let y = self.rng.gen_range(0..=img.height() - tile);
                img = img.crop_imm(x, y, tile, tile);
                None
            }
        };

        Ok(Sample {
            index,
            name: entry.name,
            image: image_to_array(&img)?,
            mask,
        })
    }

    fn list_images(dir: &Path, extensions: &[String]) -> anyhow::Result<Vec<String>> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let supported = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)));
            if let (true, Some(name)) = (supported, path.file_name()) {
                names.push(name.to_string_lossy().to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log lines
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn write_gray(path: &Path, width: u32, height: u32, value: u8) {
        GrayImage::from_pixel(width, height, Luma([value]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_paired_mode_filters_by_size_and_mask() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let masks = root.path().join("masks");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&masks).unwrap();

        write_gray(&images.join("a.png"), 16, 16, 10);
        write_gray(&masks.join("a.png"), 16, 16, 1);
        write_gray(&images.join("b.png"), 20, 16, 10);
        write_gray(&masks.join("b.png"), 20, 16, 1);
        write_gray(&images.join("c.png"), 16, 16, 10);
        fs::write(images.join("notes.txt"), "ignored").unwrap();

        let mut config = DatasetConfig::paired(&images, &masks);
        config.tile_size = 16;
        let mut dataset = TileDataset::open(&config).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.name(0), Some("a.png"));

        let sample = dataset.load(0).unwrap();
        assert_eq!(sample.spatial_size(), (16, 16));
        assert_eq!(sample.channels(), 1);
        let mask = sample.mask.unwrap();
        assert!(mask.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_paired_skips_are_warnings() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let masks = root.path().join("masks");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&masks).unwrap();

        write_gray(&images.join("wide.png"), 20, 16, 10);
        write_gray(&masks.join("wide.png"), 20, 16, 1);
        write_gray(&images.join("lonely.png"), 16, 16, 10);

        let mut config = DatasetConfig::paired(&images, &masks);
        config.tile_size = 16;

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let dataset = tracing::subscriber::with_default(subscriber, || {
            TileDataset::open(&config).unwrap()
        });

        assert!(dataset.is_empty());
        let output = logs.contents();
        assert!(output.contains("skipping wide.png: 20x16 is not a full tile"));
        assert!(output.contains("skipping lonely.png: no mask"));
    }

    #[test]
    fn test_crop_mode_cuts_tiles() {
        let root = tempfile::tempdir().unwrap();
        write_gray(&root.path().join("big.png"), 40, 30, 7);
        write_gray(&root.path().join("small.png"), 8, 8, 7);

        let mut config = DatasetConfig::cropped(root.path());
        config.tile_size = 16;
        config.seed = Some(3);
        let mut dataset = TileDataset::open(&config).unwrap();

        assert_eq!(dataset.len(), 1);
        let sample = dataset.load(0).unwrap();
        assert_eq!(sample.spatial_size(), (16, 16));
        assert!(sample.mask.is_none());
        assert!(sample.image.iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_out_of_range_index() {
        let root = tempfile::tempdir().unwrap();
        let mut dataset = TileDataset::open(&DatasetConfig::cropped(root.path())).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.load(0).is_err());
    }
}
