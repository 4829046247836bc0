//! Error types shared by the post-processing pipeline.

use thiserror::Error;

/// Failures raised while turning network output into instance masks.
#[derive(Error, Debug)]
pub enum StardistError {
    /// An input whose geometry or statistics leave the result undefined
    /// (zero-range histogram, both rasters empty, zero-area union).
    #[error("degenerate input: {context}")]
    DegenerateInput { context: String },

    /// Prediction and ground truth disagree on spatial size.
    #[error("invalid sample shape: expected {expected:?}, got {actual:?}")]
    InvalidSampleShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The raw network output does not have the (1, 1 + rays, H, W) layout
    /// or carries unusable values.
    #[error("malformed prediction: {message}")]
    MalformedPrediction { message: String },

    #[error("configuration: {message}")]
    Config { message: String },

    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    #[error("io")]
    Io(#[from] std::io::Error),
}

impl StardistError {
    pub fn degenerate(context: impl Into<String>) -> Self {
        Self::DegenerateInput {
            context: context.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPrediction {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::InvalidSampleShape { expected, actual }
    }

    /// True for the variants that describe an undefined numerical result.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, StardistError>;
