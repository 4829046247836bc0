//! Per-sample instance segmentation: reconstruct, suppress, composite

use super::prediction::RayPrediction;
use super::reconstructor::StarPolygonReconstructor;
use crate::metric::dice;
use crate::polygon::{Candidate, CandidateCollection};
use crate::utils::nms::MaskSuppressor;
use crate::utils::raster::for_each_polygon_pixel;
use anyhow::Context;
use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2, ArrayView4};
use serde::Serialize;
use stardist_core::{PostprocessConfig, Result, StardistError};
use std::path::Path;
use tracing::debug;

/// Output of one segmented sample
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// Accepted polygons painted with the foreground value.
    pub mask: Array2<u8>,
    /// Instance labels `1..=n` in acceptance order. A pixel claimed by two
    /// polygons keeps the label of the more confident one.
    pub instances: Array2<u32>,
    pub accepted: Vec<Candidate>,
    pub stats: SegmentationStats,
}

/// Counters for one segmented sample
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentationStats {
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped_degenerate: usize,
    pub mean_confidence: f64,
    pub processing_time_us: u64,
}

#[derive(Serialize)]
struct SegmentationReport<'a> {
    stats: &'a SegmentationStats,
    accepted: &'a [Candidate],
}

impl SegmentationResult {
    pub fn height(&self) -> usize {
        self.mask.nrows()
    }

    pub fn width(&self) -> usize {
        self.mask.ncols()
    }

    pub fn foreground_pixels(&self) -> usize {
        self.mask.iter().filter(|&&v| v != 0).count()
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            Luma([self.mask[[y as usize, x as usize]]])
        })
    }

    /// Export statistics and accepted polygons as JSON
    pub fn export_json(&self, output_path: &Path) -> anyhow::Result<()> {
        let report = SegmentationReport {
            stats: &self.stats,
            accepted: &self.accepted,
        };
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize segmentation result")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

/// Runs reconstruction, suppression and compositing for one sample
#[derive(Debug, Clone)]
pub struct InstanceSegmenter {
    config: PostprocessConfig,
    reconstructor: StarPolygonReconstructor,
    suppressor: MaskSuppressor,
}

impl InstanceSegmenter {
    pub fn new(config: PostprocessConfig) -> Result<Self> {
        let reconstructor = StarPolygonReconstructor::from_config(&config)?;
        let suppressor = MaskSuppressor::new(config.nms_threshold);

        Ok(Self {
            config,
            reconstructor,
            suppressor,
        })
    }

    pub fn config(&self) -> &PostprocessConfig {
        &self.config
    }

    /// Segment a raw `(1, 1 + n_rays, H, W)` network output
    pub fn segment(&self, output: ArrayView4<'_, f32>) -> Result<SegmentationResult> {
        let start_time = std::time::Instant::now();

        let prediction = RayPrediction::from_output(output, self.config.n_rays)?;
        let candidates = self.reconstructor.reconstruct(&prediction)?;
        let mut result =
            self.segment_candidates(&candidates, prediction.height(), prediction.width());

        result.stats.processing_time_us = start_time.elapsed().as_micros() as u64;
        Ok(result)
    }

    /// Suppress and composite already reconstructed candidates
    pub fn segment_candidates(
        &self,
        candidates: &CandidateCollection,
        height: usize,
        width: usize,
    ) -> SegmentationResult {
        let outcome = self.suppressor.run(candidates.as_slice(), height, width);
        let accepted = candidates.select(&outcome.accepted);

        let mut mask = Array2::<u8>::zeros((height, width));
        let mut instances = Array2::<u32>::zeros((height, width));
        let foreground = self.config.foreground_value;

        for (label, candidate) in (1u32..).zip(accepted.iter()) {
            for_each_polygon_pixel(&candidate.vertices, height, width, |y, x| {
                mask[[y, x]] = foreground;
                if instances[[y, x]] == 0 {
                    instances[[y, x]] = label;
                }
            });
        }

        let stats = SegmentationStats {
            candidates: candidates.len(),
            accepted: accepted.len(),
            rejected: outcome.rejected,
            skipped_degenerate: outcome.skipped_degenerate,
            mean_confidence: accepted.stats().avg_confidence,
            processing_time_us: 0,
        };
        debug!(
            "segmented {}x{} tile: {} of {} candidates kept",
            height, width, stats.accepted, stats.candidates
        );

        SegmentationResult {
            mask,
            instances,
            accepted: accepted.into_iter().collect(),
            stats,
        }
    }

    /// Segment and score against ground truth. Shapes are checked before any
    /// work is done.
    pub fn evaluate(
        &self,
        output: ArrayView4<'_, f32>,
        truth: ArrayView2<'_, u8>,
    ) -> Result<(SegmentationResult, f64)> {
        let (_, _, height, width) = output.dim();
        if truth.dim() != (height, width) {
            return Err(StardistError::shape_mismatch((height, width), truth.dim()));
        }

        let result = self.segment(output)?;
        let score = dice(result.mask.view(), truth)?;
        Ok((result, score))
    }
}
