//! Percentile-based intensity normalization

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use stardist_core::{NormalizationConfig, Result, StardistError};

/// Per-channel linear stretch: `output = (input + offset) * scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStretch {
    pub lower_bins: Vec<usize>,
    pub upper_bins: Vec<usize>,
    pub scale: Vec<f32>,
    pub offset: Vec<f32>,
}

impl ChannelStretch {
    pub fn channels(&self) -> usize {
        self.scale.len()
    }

    pub fn apply(&self, input: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        let channels = input.shape()[2];
        if channels != self.channels() {
            return Err(StardistError::malformed(format!(
                "stretch computed for {} channels, input has {channels}",
                self.channels()
            )));
        }

        let mut output = input.to_owned();
        for (c, mut plane) in output.axis_iter_mut(Axis(2)).enumerate() {
            let (offset, scale) = (self.offset[c], self.scale[c]);
            plane.mapv_inplace(|v| (v + offset) * scale);
        }
        Ok(output)
    }
}

/// Maps the lower percentile of each channel to 0 and the upper one to 1
#[derive(Debug, Clone)]
pub struct PercentileNormalizer {
    config: NormalizationConfig,
}

impl PercentileNormalizer {
    pub fn new(config: NormalizationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Unit-width bins over `[0, num_bins)`; other values are not counted
    pub fn histogram(&self, channel: ArrayView2<'_, f32>) -> Vec<u64> {
        let bins = self.config.num_bins;
        let mut hist = vec![0u64; bins];
        for &v in channel.iter() {
            if v >= 0.0 && v < bins as f32 {
                hist[v as usize] += 1;
            }
        }
        hist
    }

    /// Compute the stretch of every channel of an (H, W, C) image
    pub fn compute(&self, input: ArrayView3<'_, f32>) -> Result<ChannelStretch> {
        let (height, width, channels) = input.dim();
        let total = (height * width) as f64;
        let lower_target = (self.config.lower_percentile / 100.0 * total) as u64;
        let upper_target = (self.config.upper_percentile / 100.0 * total) as u64;

        let mut stretch = ChannelStretch {
            lower_bins: Vec::with_capacity(channels),
            upper_bins: Vec::with_capacity(channels),
            scale: Vec::with_capacity(channels),
            offset: Vec::with_capacity(channels),
        };

        for c in 0..channels {
            let hist = self.histogram(input.index_axis(Axis(2), c));
            let (lower, reached) = first_bin_reaching(&hist, 0, 0, lower_target).ok_or_else(|| {
                StardistError::degenerate(format!("channel {c}: lower percentile not reached"))
            })?;
            // the upper search resumes past the lower bin
            let (upper, _) = first_bin_reaching(&hist, lower + 1, reached, upper_target)
                .ok_or_else(|| {
                    StardistError::degenerate(format!(
                        "channel {c}: upper percentile not reached past bin {lower}"
                    ))
                })?;

            stretch.lower_bins.push(lower);
            stretch.upper_bins.push(upper);
            stretch.scale.push(1.0 / (upper - lower) as f32);
            stretch.offset.push(-(lower as f32));
        }

        Ok(stretch)
    }

    pub fn normalize(&self, input: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.compute(input)?.apply(input)
    }
}

impl Default for PercentileNormalizer {
    fn default() -> Self {
        Self {
            config: NormalizationConfig::default(),
        }
    }
}

/// First bin at or after `start` where the running count reaches `target`,
/// with the count at that bin
fn first_bin_reaching(
    hist: &[u64],
    start: usize,
    mut cumulative: u64,
    target: u64,
) -> Option<(usize, u64)> {
    for (bin, &count) in hist.iter().enumerate().skip(start) {
        cumulative += count;
        if cumulative >= target {
            return Some((bin, cumulative));
        }
    }
    None
}
