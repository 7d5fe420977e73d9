use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },

    #[error("{descriptors} descriptors for {keypoints} keypoints")]
    DescriptorCountMismatch { keypoints: usize, descriptors: usize },

    #[error("Float descriptor data of length {len} does not fit dimension {dim}")]
    InvalidDescriptorData { dim: usize, len: usize },

    #[error("Invalid homography: {0}")]
    InvalidHomography(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Feature extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type CoreResult<T> = Result<T, CoreError>;
