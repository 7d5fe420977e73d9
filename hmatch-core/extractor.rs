use crate::error::CoreResult;
use crate::types::{DescriptorSet, DistanceMetric, Features, Image, Keypoint};

/// Detector/descriptor capability run by one benchmark pipeline.
///
/// Implementations must return exactly one descriptor per keypoint passed to
/// [`describe`](FeatureExtractor::describe), in the same order.
pub trait FeatureExtractor: Send + Sync {
    /// Distance the descriptors are meant to be compared with
    fn metric(&self) -> DistanceMetric;

    fn detect(&self, img: &Image) -> CoreResult<Vec<Keypoint>>;

    fn describe(&self, img: &Image, keypoints: &[Keypoint]) -> CoreResult<DescriptorSet>;

    /// Detect keypoints and generate descriptors in one step
    fn detect_and_describe(&self, img: &Image) -> CoreResult<Features> {
        let keypoints = self.detect(img)?;
        let descriptors = self.describe(img, &keypoints)?;
        Features::new(keypoints, descriptors)
    }
}
