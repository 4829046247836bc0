use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use stardist_core::{DatasetConfig, EvaluationConfig};
use std::path::PathBuf;
use tracing::{info, warn};

mod calibration;

use calibration::{CalibrationLoader, SampleStretch, accuracy_metric};

#[derive(Parser)]
#[command(name = "stardist-calib")]
#[command(about = "Prepares StarDist calibration tiles and checks the post-processing setup")]
struct Args {
    /// Data directory root holding `images/` and `masks/`
    #[arg(long, default_value = "./dsb2018/train")]
    data: PathBuf,

    /// Ignore masks and take random tiles from arbitrarily sized images
    #[arg(long)]
    no_masks: bool,

    /// JSON configuration file; overrides --data and --no-masks
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile edge length in pixels
    #[arg(long)]
    tile_size: Option<u32>,

    /// Seed for random tile crops
    #[arg(long)]
    seed: Option<u64>,

    /// Write a JSON summary of the prepared tiles
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct DatasetReport {
    samples: usize,
    failed: usize,
    tile_size: u32,
    ground_truth: bool,
    stretches: Vec<SampleStretch>,
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<EvaluationConfig> {
    let mut config = match &args.config {
        Some(path) => EvaluationConfig::from_json_file(path)?,
        None => {
            let images = args.data.join("images");
            let dataset = if args.no_masks {
                DatasetConfig::cropped(images)
            } else {
                DatasetConfig::paired(images, args.data.join("masks"))
            };
            EvaluationConfig::new(dataset)?
        }
    };

    if let Some(tile_size) = args.tile_size {
        config.dataset.tile_size = tile_size;
    }
    if args.seed.is_some() {
        config.dataset.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = build_config(&args)?;
    let mut loader = CalibrationLoader::from_config(&config)?;
    let metric = accuracy_metric(&config)?;

    let mut report = DatasetReport {
        samples: 0,
        failed: 0,
        tile_size: config.dataset.tile_size,
        ground_truth: config.dataset.has_ground_truth(),
        stretches: Vec::with_capacity(loader.len()),
    };

    for index in 0..loader.len() {
        match loader.get(index) {
            Ok(item) => {
                info!(
                    "{}: input {:?}, bins {:?}..{:?}",
                    item.name, item.input.shape(), item.stretch.lower_bins, item.stretch.upper_bins
                );
                report.samples += 1;
                report.stretches.push(item.stretch);
            }
            Err(e) => {
                warn!("sample {index} skipped: {e:#}");
                report.failed += 1;
            }
        }
    }

    info!(
        "Prepared {} tiles ({} skipped), tile size {}",
        report.samples, report.failed, report.tile_size
    );
    match &metric {
        Some(m) => {
            use stardist_cv::traits::Metric;
            let postprocess = m.segmenter().config();
            info!(
                "Accuracy metric: {} (higher is better: {}), confidence > {}, IoU <= {}",
                m.name(),
                m.higher_better(),
                postprocess.confidence_threshold,
                postprocess.nms_threshold
            );
        }
        None => info!("No ground truth: calibration runs without an accuracy metric"),
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        info!("Report saved: {:?}", path);
    }

    Ok(())
}
