use crate::error::{CoreError, CoreResult};
use crate::types::DistanceMetric;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds and scheduling shared by every pipeline of a run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvalConfig {
    /// Nearest/second-nearest distance ratio a match must stay below
    pub nndr_ratio: f32,
    /// Maximum reprojection error (pixels) of an inlier
    pub inlier_threshold: f64,
    /// Run pipelines concurrently
    pub parallel: bool,
    pub n_threads: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            nndr_ratio: 0.8,
            inlier_threshold: 2.5,
            parallel: true,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> CoreResult<()> {
        validate_ratio(self.nndr_ratio)?;
        validate_threshold(self.inlier_threshold)?;
        if self.n_threads == 0 {
            return Err(CoreError::InvalidConfig(
                "n_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_ratio(ratio: f32) -> CoreResult<()> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(CoreError::InvalidConfig(format!(
            "nndr_ratio {} must lie in (0, 1)",
            ratio
        )));
    }
    Ok(())
}

fn validate_threshold(threshold: f64) -> CoreResult<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(CoreError::InvalidConfig(format!(
            "inlier_threshold {} must be finite and >= 0",
            threshold
        )));
    }
    Ok(())
}

/// FAST corner + steered BRIEF at full resolution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbParams {
    pub threshold: u8,
    pub patch_size: usize,
    pub nms_distance: f32,
    pub max_keypoints: usize,
    /// Seed of the BRIEF sampling pattern
    pub seed: u64,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            nms_distance: 3.0,
            max_keypoints: 1500,
            seed: 0x0b5e55ed,
        }
    }
}

/// FAST + steered BRIEF over an image pyramid
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PyramidOrbParams {
    pub threshold: u8,
    pub patch_size: usize,
    pub nms_distance: f32,
    pub max_keypoints: usize,
    pub levels: usize,
    pub scale_factor: f32,
    pub seed: u64,
}

impl Default for PyramidOrbParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            patch_size: 31,
            nms_distance: 3.0,
            max_keypoints: 1500,
            levels: 4,
            scale_factor: 1.2,
            seed: 0x0b5e55ed,
        }
    }
}

/// FAST corner + normalized float intensity patch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PatchParams {
    pub threshold: u8,
    pub patch_size: usize,
    pub nms_distance: f32,
    pub max_keypoints: usize,
    /// Samples per side of the descriptor grid
    pub grid: usize,
    /// Half-extent of the sampled patch in pixels
    pub radius: f32,
}

impl Default for PatchParams {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            nms_distance: 3.0,
            max_keypoints: 1500,
            grid: 8,
            radius: 12.0,
        }
    }
}

/// Which built-in detector/descriptor a pipeline runs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DetectorSpec {
    Orb(OrbParams),
    PyramidOrb(PyramidOrbParams),
    Patch(PatchParams),
}

impl DetectorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            DetectorSpec::Orb(_) => "orb",
            DetectorSpec::PyramidOrb(_) => "pyramid_orb",
            DetectorSpec::Patch(_) => "patch",
        }
    }
}

/// One named pipeline plus optional per-pipeline threshold overrides
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    pub name: String,
    pub detector: DetectorSpec,
    /// Overrides the descriptor's natural metric
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub metric: Option<DistanceMetric>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub nndr_ratio: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub inlier_threshold: Option<f64>,
}

impl PipelineConfig {
    pub fn new(name: &str, detector: DetectorSpec) -> Self {
        Self {
            name: name.to_string(),
            detector,
            metric: None,
            nndr_ratio: None,
            inlier_threshold: None,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_nndr_ratio(mut self, ratio: f32) -> Self {
        self.nndr_ratio = Some(ratio);
        self
    }

    pub fn with_inlier_threshold(mut self, threshold: f64) -> Self {
        self.inlier_threshold = Some(threshold);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "pipeline name must not be empty".to_string(),
            ));
        }
        if let Some(ratio) = self.nndr_ratio {
            validate_ratio(ratio)?;
        }
        if let Some(threshold) = self.inlier_threshold {
            validate_threshold(threshold)?;
        }
        Ok(())
    }
}

/// Complete benchmark configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BenchConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub evaluation: EvalConfig,
    #[cfg_attr(feature = "serde", serde(default = "default_pipelines"))]
    pub pipelines: Vec<PipelineConfig>,
}

/// The three stock pipelines: corner/binary, pyramid/binary, corner/float
pub fn default_pipelines() -> Vec<PipelineConfig> {
    vec![
        PipelineConfig::new("orb", DetectorSpec::Orb(OrbParams::default())),
        PipelineConfig::new(
            "pyramid-orb",
            DetectorSpec::PyramidOrb(PyramidOrbParams::default()),
        ),
        PipelineConfig::new("patch", DetectorSpec::Patch(PatchParams::default())),
    ]
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            evaluation: EvalConfig::default(),
            pipelines: default_pipelines(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.evaluation.validate()?;
        if self.pipelines.is_empty() {
            return Err(CoreError::InvalidConfig(
                "at least one pipeline is required".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for pipeline in &self.pipelines {
            pipeline.validate()?;
            if !names.insert(pipeline.name.as_str()) {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name
                )));
            }
        }
        Ok(())
    }

    /// Load from a `.toml` or `.json` file, chosen by extension
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        };
        parsed.map_err(|e| match e {
            CoreError::Parse { message, .. } => CoreError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| CoreError::Parse {
            path: "<toml>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| CoreError::Parse {
            path: "<json>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = BenchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.evaluation.nndr_ratio, 0.8);
        assert_eq!(cfg.evaluation.inlier_threshold, 2.5);
        assert_eq!(cfg.pipelines.len(), 3);
    }

    #[test]
    fn test_invalid_ratio() {
        for ratio in [0.0, 1.0, -0.5, f32::NAN] {
            let cfg = EvalConfig {
                nndr_ratio: ratio,
                ..EvalConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_invalid_threshold() {
        for threshold in [-1.0, f64::INFINITY, f64::NAN] {
            let cfg = EvalConfig {
                inlier_threshold: threshold,
                ..EvalConfig::default()
            };
            assert!(cfg.validate().is_err());
        }
        let zero = EvalConfig {
            inlier_threshold: 0.0,
            ..EvalConfig::default()
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn test_pipeline_overrides() {
        let pipeline = PipelineConfig::new("strict", DetectorSpec::Orb(OrbParams::default()))
            .with_nndr_ratio(0.6)
            .with_inlier_threshold(1.0);
        assert_eq!(pipeline.nndr_ratio, Some(0.6));
        assert_eq!(pipeline.inlier_threshold, Some(1.0));
        assert!(pipeline.validate().is_ok());

        let bad = PipelineConfig::new("bad", DetectorSpec::Orb(OrbParams::default()))
            .with_nndr_ratio(1.5);
        assert!(matches!(bad.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_and_empty_pipelines() {
        let mut cfg = BenchConfig::default();
        cfg.pipelines.push(PipelineConfig::new(
            "orb",
            DetectorSpec::Orb(OrbParams::default()),
        ));
        assert!(cfg.validate().is_err());

        cfg.pipelines.clear();
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_config() {
        let cfg = BenchConfig::from_toml(
            r#"
            [evaluation]
            nndr_ratio = 0.7
            parallel = false

            [[pipelines]]
            name = "orb-fine"
            nndr_ratio = 0.6

            [pipelines.detector]
            kind = "orb"
            threshold = 12

            [[pipelines]]
            name = "patch"
            metric = "euclidean"

            [pipelines.detector]
            kind = "patch"
            grid = 6
            "#,
        )
        .unwrap();

        assert_eq!(cfg.evaluation.nndr_ratio, 0.7);
        assert_eq!(cfg.evaluation.inlier_threshold, 2.5);
        assert!(!cfg.evaluation.parallel);
        assert_eq!(cfg.pipelines.len(), 2);
        match &cfg.pipelines[0].detector {
            DetectorSpec::Orb(p) => {
                assert_eq!(p.threshold, 12);
                assert_eq!(p.patch_size, 31);
            }
            other => panic!("unexpected detector {:?}", other),
        }
        assert_eq!(cfg.pipelines[1].metric, Some(DistanceMetric::Euclidean));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_rejects_invalid_values() {
        let result = BenchConfig::from_json(r#"{"evaluation": {"nndr_ratio": 1.5}}"#);
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_serialization_reloads() {
        let cfg = BenchConfig::default();
        let text = cfg.to_toml().unwrap();
        let reloaded = BenchConfig::from_toml(&text).unwrap();
        assert_eq!(reloaded.pipelines, cfg.pipelines);
    }
}
