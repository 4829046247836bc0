//! View over the raw network output

use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayView4, ArrayViewD, Axis, Ix4, s};
use stardist_core::{Result, StardistError};

/// Probability map plus per-pixel ray distances of one sample.
///
/// Wraps a `(1, 1 + n_rays, H, W)` tensor: channel 0 is the center
/// probability, channels `1..=n_rays` are the ray distances.
#[derive(Debug, Clone)]
pub struct RayPrediction<'a> {
    channels: ArrayView3<'a, f32>,
    n_rays: usize,
}

impl<'a> RayPrediction<'a> {
    pub fn from_output(output: ArrayView4<'a, f32>, n_rays: usize) -> Result<Self> {
        let (batch, channels, height, width) = output.dim();
        if batch != 1 {
            return Err(StardistError::malformed(format!(
                "expected batch size 1, got {batch}"
            )));
        }
        if channels != n_rays + 1 {
            return Err(StardistError::malformed(format!(
                "expected {} channels (probability + {} rays), got {channels}",
                n_rays + 1,
                n_rays
            )));
        }
        if height == 0 || width == 0 {
            return Err(StardistError::malformed("empty spatial size"));
        }

        Ok(Self {
            channels: output.index_axis_move(Axis(0), 0),
            n_rays,
        })
    }

    /// Accept a tensor of unknown rank, as handed over by an inference engine
    pub fn from_dyn(output: ArrayViewD<'a, f32>, n_rays: usize) -> Result<Self> {
        let ndim = output.ndim();
        let output = output.into_dimensionality::<Ix4>().map_err(|_| {
            StardistError::malformed(format!("expected a 4-D tensor, got {ndim} dimensions"))
        })?;
        Self::from_output(output, n_rays)
    }

    pub fn height(&self) -> usize {
        self.channels.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.channels.shape()[2]
    }

    pub fn n_rays(&self) -> usize {
        self.n_rays
    }

    pub fn probabilities(&self) -> ArrayView2<'_, f32> {
        self.channels.index_axis(Axis(0), 0)
    }

    pub fn probability(&self, row: usize, col: usize) -> f32 {
        self.channels[[0, row, col]]
    }

    /// Distances of all rays at one pixel, in angle order
    pub fn distances(&self, row: usize, col: usize) -> ArrayView1<'_, f32> {
        self.channels.slice(s![1.., row, col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array4, IxDyn};

    #[test]
    fn test_channel_layout() {
        let mut output = Array4::<f32>::zeros((1, 5, 3, 4));
        output[[0, 0, 1, 2]] = 0.9;
        output[[0, 3, 1, 2]] = 6.0;

        let pred = RayPrediction::from_output(output.view(), 4).unwrap();
        assert_eq!((pred.height(), pred.width()), (3, 4));
        assert_eq!(pred.probability(1, 2), 0.9);
        assert_eq!(pred.distances(1, 2).len(), 4);
        assert_eq!(pred.distances(1, 2)[2], 6.0);
    }

    #[test]
    fn test_rejects_bad_layouts() {
        let wrong_batch = Array4::<f32>::zeros((2, 33, 4, 4));
        assert!(RayPrediction::from_output(wrong_batch.view(), 32).is_err());

        let wrong_channels = Array4::<f32>::zeros((1, 32, 4, 4));
        let err = RayPrediction::from_output(wrong_channels.view(), 32).unwrap_err();
        assert!(matches!(err, StardistError::MalformedPrediction { .. }));

        let flat = ndarray::ArrayD::<f32>::zeros(IxDyn(&[33, 4, 4]));
        assert!(RayPrediction::from_dyn(flat.view(), 32).is_err());
    }
}
