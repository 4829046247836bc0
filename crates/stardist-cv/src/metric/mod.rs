//! Evaluation metrics

pub mod dice;

pub use dice::{DiceScorer, dice};

use crate::detection::InstanceSegmenter;
use crate::traits::Metric;
use ndarray::{ArrayView2, ArrayView4};
use stardist_core::{PostprocessConfig, Result, StardistError};

/// Dice accuracy of segmented network outputs, as consumed by a calibration
/// harness
#[derive(Debug, Clone)]
pub struct DiceMetric {
    segmenter: InstanceSegmenter,
    scorer: DiceScorer,
}

impl DiceMetric {
    pub fn new(config: PostprocessConfig) -> Result<Self> {
        Ok(Self {
            segmenter: InstanceSegmenter::new(config)?,
            scorer: DiceScorer::new(),
        })
    }

    pub fn segmenter(&self) -> &InstanceSegmenter {
        &self.segmenter
    }
}

impl Metric for DiceMetric {
    fn name(&self) -> &str {
        self.scorer.name()
    }

    fn update(&mut self, output: ArrayView4<'_, f32>, annotation: ArrayView2<'_, u8>) -> Result<f64> {
        let (_, _, height, width) = output.dim();
        if annotation.dim() != (height, width) {
            return Err(StardistError::shape_mismatch((height, width), annotation.dim()));
        }

        let result = self.segmenter.segment(output)?;
        self.scorer.update(result.mask.view(), annotation)
    }

    fn value(&self) -> Option<f64> {
        self.scorer.value()
    }

    fn avg_value(&self) -> Option<f64> {
        self.scorer.avg_value()
    }

    fn reset(&mut self) {
        self.scorer.reset();
    }

    fn higher_better(&self) -> bool {
        self.scorer.higher_better()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array4, s};

    #[test]
    fn test_metric_tracks_samples() {
        let mut metric = DiceMetric::new(PostprocessConfig::default()).unwrap();
        let mut output = Array4::<f32>::zeros((1, 33, 32, 32));
        output[[0, 0, 16, 16]] = 0.9;
        output.slice_mut(s![0, 1.., 16, 16]).fill(6.0);

        let reference = metric.segmenter().segment(output.view()).unwrap().mask;
        let disjoint = {
            let mut truth = Array2::<u8>::zeros((32, 32));
            truth.slice_mut(s![0..3, 0..3]).fill(1);
            truth
        };

        assert_eq!(metric.update(output.view(), reference.view()).unwrap(), 1.0);
        assert_eq!(metric.update(output.view(), disjoint.view()).unwrap(), 0.0);
        assert_eq!(metric.name(), "Dice");
        assert_eq!(metric.segmenter().config().nms_threshold, 0.5);
        assert_eq!(metric.value(), Some(0.0));
        assert_eq!(metric.avg_value(), Some(0.5));

        metric.reset();
        assert_eq!(metric.value(), None);
    }
}
