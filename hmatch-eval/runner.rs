use crate::error::EvalResult;
use crate::inliers::classify_correspondences;
use crate::matcher::knn2;
use crate::nndr::nndr_filter;
use hmatch_core::{
    BenchConfig, ClassifiedCorrespondence, CoreError, DistanceMetric, EvalConfig,
    FeatureExtractor, Features, Homography, Image, Keypoint, PartialCounts, PipelineConfig,
    PipelineResult, Stage,
};
use hmatch_features::build_extractor;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// The two views being compared; the homography maps `left` onto `right`
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub left: Image,
    pub right: Image,
}

impl ImagePair {
    pub fn new(left: Image, right: Image) -> Self {
        Self { left, right }
    }
}

/// Per-pipeline replacements for the shared evaluation thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineOverrides {
    pub nndr_ratio: Option<f32>,
    pub inlier_threshold: Option<f64>,
}

/// A named detector/descriptor capability and the metric its descriptors are matched with
pub struct Pipeline {
    pub name: String,
    pub metric: DistanceMetric,
    pub extractor: Box<dyn FeatureExtractor>,
    pub overrides: PipelineOverrides,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("metric", &self.metric)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline matching with the extractor's own metric
    pub fn new(name: &str, extractor: Box<dyn FeatureExtractor>) -> Self {
        Self {
            name: name.to_string(),
            metric: extractor.metric(),
            extractor,
            overrides: PipelineOverrides::default(),
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_overrides(mut self, overrides: PipelineOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Build the built-in extractor a configuration entry names
    pub fn from_config(cfg: &PipelineConfig) -> EvalResult<Self> {
        cfg.validate()?;
        let extractor = build_extractor(&cfg.detector).map_err(CoreError::from)?;
        let mut pipeline = Self::new(&cfg.name, extractor).with_overrides(PipelineOverrides {
            nndr_ratio: cfg.nndr_ratio,
            inlier_threshold: cfg.inlier_threshold,
        });
        if let Some(metric) = cfg.metric {
            pipeline = pipeline.with_metric(metric);
        }
        Ok(pipeline)
    }

    /// Shared settings with this pipeline's overrides applied
    pub fn evaluation(&self, base: &EvalConfig) -> EvalConfig {
        EvalConfig {
            nndr_ratio: self.overrides.nndr_ratio.unwrap_or(base.nndr_ratio),
            inlier_threshold: self
                .overrides
                .inlier_threshold
                .unwrap_or(base.inlier_threshold),
            ..base.clone()
        }
    }
}

struct StageFailure {
    stage: Stage,
    message: String,
}

fn at_stage<E: fmt::Display>(stage: Stage) -> impl FnOnce(E) -> StageFailure {
    move |err| StageFailure {
        stage,
        message: err.to_string(),
    }
}

struct Evaluation {
    keypoints1: Vec<Keypoint>,
    keypoints2: Vec<Keypoint>,
    correspondences: Vec<ClassifiedCorrespondence>,
}

/// Runs every pipeline over the same image pair and ground truth
#[derive(Debug)]
pub struct BenchmarkRunner {
    config: EvalConfig,
    pipelines: Vec<Pipeline>,
}

impl BenchmarkRunner {
    pub fn new(config: EvalConfig, pipelines: Vec<Pipeline>) -> Self {
        Self { config, pipelines }
    }

    /// Validate the configuration and instantiate its pipelines
    pub fn from_config(bench: &BenchConfig) -> EvalResult<Self> {
        bench.validate()?;
        let pipelines = bench
            .pipelines
            .iter()
            .map(Pipeline::from_config)
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Self::new(bench.evaluation.clone(), pipelines))
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// One result per pipeline, in pipeline order.
    ///
    /// A failing pipeline is reported in its own result and never stops the others.
    pub fn run(&self, images: &ImagePair, homography: &Homography) -> Vec<PipelineResult> {
        info!(
            "running {} pipelines ({})",
            self.pipelines.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );
        if self.config.parallel {
            self.pipelines
                .par_iter()
                .map(|pipeline| self.run_pipeline(pipeline, images, homography))
                .collect()
        } else {
            self.pipelines
                .iter()
                .map(|pipeline| self.run_pipeline(pipeline, images, homography))
                .collect()
        }
    }

    fn run_pipeline(
        &self,
        pipeline: &Pipeline,
        images: &ImagePair,
        homography: &Homography,
    ) -> PipelineResult {
        let start = Instant::now();
        let mut counts = PartialCounts::default();
        let outcome = self.evaluate(pipeline, images, homography, &mut counts);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(evaluation) => {
                let result = PipelineResult::completed(
                    &pipeline.name,
                    pipeline.metric,
                    evaluation.keypoints1,
                    evaluation.keypoints2,
                    evaluation.correspondences,
                    elapsed_ms,
                );
                match result.inlier_ratio {
                    Some(ratio) => info!(
                        "{}: {} matches, {} inliers ({:.2}%) in {:.2} ms",
                        result.name, result.n_matches, result.n_inliers, ratio, elapsed_ms
                    ),
                    None => warn!(
                        "{}: no matches ({} / {} keypoints)",
                        result.name, result.n_keypoints1, result.n_keypoints2
                    ),
                }
                result
            }
            Err(failure) => {
                warn!(
                    "{}: {} failed: {}",
                    pipeline.name, failure.stage, failure.message
                );
                PipelineResult::failed(
                    &pipeline.name,
                    pipeline.metric,
                    counts,
                    failure.stage,
                    failure.message,
                    elapsed_ms,
                )
            }
        }
    }

    fn evaluate(
        &self,
        pipeline: &Pipeline,
        images: &ImagePair,
        homography: &Homography,
        counts: &mut PartialCounts,
    ) -> Result<Evaluation, StageFailure> {
        let settings = pipeline.evaluation(&self.config);
        settings.validate().map_err(at_stage(Stage::Setup))?;
        let extractor = pipeline.extractor.as_ref();

        let keypoints1 = extractor
            .detect(&images.left)
            .map_err(at_stage(Stage::Detect))?;
        counts.n_keypoints1 = keypoints1.len();
        let keypoints2 = extractor
            .detect(&images.right)
            .map_err(at_stage(Stage::Detect))?;
        counts.n_keypoints2 = keypoints2.len();
        debug!(
            "{}: detected {} / {} keypoints",
            pipeline.name, counts.n_keypoints1, counts.n_keypoints2
        );

        let descriptors1 = extractor
            .describe(&images.left, &keypoints1)
            .map_err(at_stage(Stage::Describe))?;
        let features1 = Features::new(keypoints1, descriptors1).map_err(at_stage(Stage::Describe))?;
        let descriptors2 = extractor
            .describe(&images.right, &keypoints2)
            .map_err(at_stage(Stage::Describe))?;
        let features2 = Features::new(keypoints2, descriptors2).map_err(at_stage(Stage::Describe))?;
        debug!("{}: described both images", pipeline.name);

        let candidates =
            knn2(&features1, &features2, pipeline.metric).map_err(at_stage(Stage::Match))?;
        let accepted = nndr_filter(&candidates, settings.nndr_ratio);
        debug!(
            "{}: {} of {} candidates pass ratio {}",
            pipeline.name,
            accepted.len(),
            candidates.len(),
            settings.nndr_ratio
        );

        let correspondences =
            classify_correspondences(&accepted, homography, settings.inlier_threshold);

        Ok(Evaluation {
            keypoints1: features1.into_keypoints(),
            keypoints2: features2.into_keypoints(),
            correspondences,
        })
    }
}
