use hmatch_core::{CoreError, DistanceMetric};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{metric} distance cannot compare {descriptors} descriptors")]
    MetricMismatch {
        metric: DistanceMetric,
        descriptors: &'static str,
    },

    #[error("Descriptor dimensions differ: {query} vs {train}")]
    DimensionMismatch { query: usize, train: usize },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type EvalResult<T> = Result<T, EvalError>;
