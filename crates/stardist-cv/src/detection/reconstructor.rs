//! Star-polygon reconstruction from ray-distance predictions

use super::angles::RayAngles;
use super::prediction::RayPrediction;
use crate::polygon::{Candidate, CandidateCollection, Point};
use stardist_core::{PostprocessConfig, Result, StardistError};
use tracing::debug;

/// Turns every confident pixel into a polygon around it
#[derive(Debug, Clone)]
pub struct StarPolygonReconstructor {
    angles: RayAngles,
    confidence_threshold: f32,
}

impl StarPolygonReconstructor {
    pub fn new(angles: RayAngles, confidence_threshold: f32) -> Self {
        Self {
            angles,
            confidence_threshold,
        }
    }

    pub fn from_config(config: &PostprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            RayAngles::new(config.n_rays)?,
            config.confidence_threshold,
        ))
    }

    /// One candidate per pixel whose probability is strictly above the
    /// threshold, in row-major order.
    pub fn reconstruct(&self, prediction: &RayPrediction<'_>) -> Result<CandidateCollection> {
        if prediction.n_rays() != self.angles.len() {
            return Err(StardistError::malformed(format!(
                "prediction carries {} rays, reconstructor expects {}",
                prediction.n_rays(),
                self.angles.len()
            )));
        }

        let (height, width) = (prediction.height(), prediction.width());
        let probabilities = prediction.probabilities();
        let mut candidates = CandidateCollection::new();

        for ((row, col), &probability) in probabilities.indexed_iter() {
            // NaN never passes.
            if !(probability > self.confidence_threshold) {
                continue;
            }

            let distances = prediction.distances(row, col);
            let mut vertices = Vec::with_capacity(self.angles.len());
            for (&distance, (cos, sin)) in distances.iter().zip(self.angles.directions()) {
                if !distance.is_finite() {
                    return Err(StardistError::malformed(format!(
                        "non-finite ray distance at row {row}, col {col}"
                    )));
                }
                let d = f64::from(distance);
                let x = (col as f64 + d * cos).round() as i32;
                let y = (row as f64 + d * sin).round() as i32;
                vertices.push(Point::new(x, y).clamp_to(width, height));
            }

            let index = candidates.len();
            candidates.push(Candidate::new(
                index,
                Point::new(col as i32, row as i32),
                vertices,
                probability,
            ));
        }

        debug!(
            "reconstructed {} candidates from {}x{} prediction",
            candidates.len(),
            height,
            width
        );
        Ok(candidates)
    }
}
