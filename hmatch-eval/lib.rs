//! Matching evaluation: brute-force k=2 matching, the ratio test, homography
//! inlier classification and the runner that drives every pipeline.

pub mod error;
pub mod inliers;
pub mod matcher;
pub mod nndr;
pub mod runner;

pub use error::{EvalError, EvalResult};
pub use inliers::{classify, classify_correspondences, count_inliers};
pub use matcher::{euclidean_distance, hamming_distance, knn2};
pub use nndr::{nndr_filter, passes_ratio_test};
pub use runner::{BenchmarkRunner, ImagePair, Pipeline, PipelineOverrides};
