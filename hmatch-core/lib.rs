//! Shared data model for evaluating feature matches against a ground-truth homography.

pub mod config;
pub mod error;
pub mod extractor;
pub mod homography;
pub mod result;
pub mod types;

pub use config::{
    default_pipelines, BenchConfig, DetectorSpec, EvalConfig, OrbParams, PatchParams,
    PipelineConfig, PyramidOrbParams,
};
pub use error::{CoreError, CoreResult};
pub use extractor::FeatureExtractor;
pub use homography::Homography;
pub use result::{inlier_ratio, PartialCounts, PipelineResult, PipelineStatus, Stage};
pub use types::{
    BinaryDescriptor, Classification, ClassifiedCorrespondence, Correspondence, DescriptorSet,
    DistanceMetric, Features, Image, Keypoint, MatchCandidate, Neighbor, Point2,
};

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> CoreResult<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()?;
    Ok(())
}
