//! Dice overlap between predicted and ground-truth rasters

use ndarray::{ArrayView2, Zip};
use stardist_core::{Result, StardistError};

/// `2 |P ∩ T| / (|P| + |T|)` over nonzero pixels
pub fn dice(pred: ArrayView2<'_, u8>, truth: ArrayView2<'_, u8>) -> Result<f64> {
    if pred.dim() != truth.dim() {
        return Err(StardistError::shape_mismatch(truth.dim(), pred.dim()));
    }

    let (inter, pred_count, truth_count) = Zip::from(&pred).and(&truth).fold(
        (0usize, 0usize, 0usize),
        |(inter, p_count, t_count), &p, &t| {
            let (p, t) = (p != 0, t != 0);
            (
                inter + usize::from(p && t),
                p_count + usize::from(p),
                t_count + usize::from(t),
            )
        },
    );

    let denominator = pred_count + truth_count;
    if denominator == 0 {
        return Err(StardistError::degenerate(
            "Dice undefined: prediction and ground truth are both empty",
        ));
    }
    Ok(2.0 * inter as f64 / denominator as f64)
}

/// Running collection of per-sample Dice scores.
///
/// Scores accumulate until [`DiceScorer::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct DiceScorer {
    values: Vec<f64>,
}

impl DiceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "Dice"
    }

    /// Score one sample; failed samples leave the accumulator untouched.
    pub fn update(&mut self, pred: ArrayView2<'_, u8>, truth: ArrayView2<'_, u8>) -> Result<f64> {
        let score = dice(pred, truth)?;
        self.values.push(score);
        Ok(score)
    }

    /// Score many samples, appending successful scores in input order
    #[cfg(feature = "parallel")]
    pub fn update_batch(
        &mut self,
        pairs: &[(ArrayView2<'_, u8>, ArrayView2<'_, u8>)],
    ) -> Vec<Result<f64>> {
        use rayon::prelude::*;

        let results: Vec<Result<f64>> = pairs
            .par_iter()
            .map(|(pred, truth)| dice(pred.view(), truth.view()))
            .collect();
        self.values
            .extend(results.iter().filter_map(|r| r.as_ref().ok().copied()));
        results
    }

    /// Score many samples, appending successful scores in input order
    #[cfg(not(feature = "parallel"))]
    pub fn update_batch(
        &mut self,
        pairs: &[(ArrayView2<'_, u8>, ArrayView2<'_, u8>)],
    ) -> Vec<Result<f64>> {
        pairs
            .iter()
            .map(|(pred, truth)| self.update(pred.view(), truth.view()))
            .collect()
    }

    /// Most recent score
    pub fn value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Mean over every score since the last reset
    pub fn avg_value(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    pub fn higher_better(&self) -> bool {
        true
    }
}
