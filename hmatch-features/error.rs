use hmatch_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),

    #[error("Invalid patch size {0} (must be odd and >= 3)")]
    InvalidPatchSize(usize),

    #[error("Image {width}x{height} too small (minimum {min_size}x{min_size})")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min_size: usize,
    },

    #[error("Invalid pyramid: {0}")]
    InvalidPyramid(String),

    #[error("Invalid descriptor layout: {0}")]
    InvalidDescriptor(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<FeatureError> for CoreError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::Core(inner) => inner,
            other => CoreError::Extraction(other.to_string()),
        }
    }
}

pub type FeatureResult<T> = Result<T, FeatureError>;
