use crate::brief::BriefDescriptor;
use crate::detector::{FastConfig, FastDetector, MIN_IMAGE_SIZE};
use crate::error::FeatureResult;
use crate::patch::PatchDescriptor;
use crate::preprocessing::ImagePreprocessing;
use crate::pyramid::ImagePyramid;
use hmatch_core::{
    CoreResult, DescriptorSet, DetectorSpec, DistanceMetric, FeatureExtractor, Image, Keypoint,
    OrbParams, PatchParams, PyramidOrbParams,
};
use log::debug;

/// Box-blur radius applied before sampling descriptors
const SMOOTHING_RADIUS: usize = 2;

/// FAST corners + steered BRIEF at full resolution
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    detector: FastDetector,
    brief: BriefDescriptor,
}

impl OrbExtractor {
    pub fn new(params: &OrbParams) -> FeatureResult<Self> {
        let detector = FastDetector::new(FastConfig {
            threshold: params.threshold,
            patch_size: params.patch_size,
            nms_distance: params.nms_distance,
            max_keypoints: params.max_keypoints,
        })?;
        let brief = BriefDescriptor::new(params.patch_size, params.seed)?;
        Ok(Self { detector, brief })
    }
}

impl FeatureExtractor for OrbExtractor {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Hamming
    }

    fn detect(&self, img: &Image) -> CoreResult<Vec<Keypoint>> {
        Ok(self.detector.detect_keypoints(img)?)
    }

    fn describe(&self, img: &Image, keypoints: &[Keypoint]) -> CoreResult<DescriptorSet> {
        let smoothed = ImagePreprocessing::box_blur(img, SMOOTHING_RADIUS)?;
        Ok(DescriptorSet::Binary(
            self.brief.generate_descriptors(&smoothed, keypoints),
        ))
    }
}

/// FAST on every pyramid level, steered BRIEF with the pattern scaled to the level
#[derive(Debug, Clone)]
pub struct PyramidOrbExtractor {
    detector: FastDetector,
    brief: BriefDescriptor,
    levels: usize,
    scale_factor: f32,
    max_keypoints: usize,
}

impl PyramidOrbExtractor {
    pub fn new(params: &PyramidOrbParams) -> FeatureResult<Self> {
        // rejects zero levels and scale factors <= 1
        ImagePyramid::generate_scale_levels(MIN_IMAGE_SIZE, MIN_IMAGE_SIZE, params.levels, params.scale_factor, 1)?;
        let detector = FastDetector::new(FastConfig {
            threshold: params.threshold,
            patch_size: params.patch_size,
            nms_distance: params.nms_distance,
            max_keypoints: params.max_keypoints,
        })?;
        let brief = BriefDescriptor::new(params.patch_size, params.seed)?;
        Ok(Self {
            detector,
            brief,
            levels: params.levels,
            scale_factor: params.scale_factor,
            max_keypoints: params.max_keypoints,
        })
    }
}

impl FeatureExtractor for PyramidOrbExtractor {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Hamming
    }

    fn detect(&self, img: &Image) -> CoreResult<Vec<Keypoint>> {
        let (width, height) = img.dimensions();
        let scale_levels = ImagePyramid::generate_scale_levels(
            width,
            height,
            self.levels,
            self.scale_factor,
            MIN_IMAGE_SIZE,
        )?;
        let pyramid = ImagePyramid::build_image_pyramid(img, &scale_levels)?;

        let mut keypoints = Vec::new();
        for (scale_level, level_img) in scale_levels.iter().zip(&pyramid) {
            let found = self.detector.detect_keypoints(level_img)?;
            debug!(
                "pyramid level {} ({}x{}): {} keypoints",
                scale_level.level,
                scale_level.width,
                scale_level.height,
                found.len()
            );
            keypoints.extend(found.into_iter().map(|kp| Keypoint {
                x: kp.x * scale_level.scale,
                y: kp.y * scale_level.scale,
                scale: scale_level.scale,
                ..kp
            }));
        }

        // Strongest first across levels, stable within a level
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(self.max_keypoints);
        Ok(keypoints)
    }

    fn describe(&self, img: &Image, keypoints: &[Keypoint]) -> CoreResult<DescriptorSet> {
        let smoothed = ImagePreprocessing::box_blur(img, SMOOTHING_RADIUS)?;
        Ok(DescriptorSet::Binary(
            self.brief.generate_descriptors(&smoothed, keypoints),
        ))
    }
}

/// FAST corners + float intensity patch
#[derive(Debug, Clone)]
pub struct PatchExtractor {
    detector: FastDetector,
    patch: PatchDescriptor,
}

impl PatchExtractor {
    pub fn new(params: &PatchParams) -> FeatureResult<Self> {
        let detector = FastDetector::new(FastConfig {
            threshold: params.threshold,
            patch_size: params.patch_size,
            nms_distance: params.nms_distance,
            max_keypoints: params.max_keypoints,
        })?;
        let patch = PatchDescriptor::new(params.grid, params.radius)?;
        Ok(Self { detector, patch })
    }
}

impl FeatureExtractor for PatchExtractor {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Euclidean
    }

    fn detect(&self, img: &Image) -> CoreResult<Vec<Keypoint>> {
        Ok(self.detector.detect_keypoints(img)?)
    }

    fn describe(&self, img: &Image, keypoints: &[Keypoint]) -> CoreResult<DescriptorSet> {
        let smoothed = ImagePreprocessing::box_blur(img, SMOOTHING_RADIUS)?;
        Ok(self.patch.generate_descriptors(&smoothed, keypoints)?)
    }
}

/// Instantiate the built-in extractor a configuration entry names
pub fn build_extractor(spec: &DetectorSpec) -> FeatureResult<Box<dyn FeatureExtractor>> {
    Ok(match spec {
        DetectorSpec::Orb(params) => Box::new(OrbExtractor::new(params)?),
        DetectorSpec::PyramidOrb(params) => Box::new(PyramidOrbExtractor::new(params)?),
        DetectorSpec::Patch(params) => Box::new(PatchExtractor::new(params)?),
    })
}
