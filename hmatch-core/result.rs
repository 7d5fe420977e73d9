use crate::types::{ClassifiedCorrespondence, DistanceMetric, Keypoint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Stage {
    Setup,
    Detect,
    Describe,
    Match,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Detect => write!(f, "detection"),
            Stage::Describe => write!(f, "description"),
            Stage::Match => write!(f, "matching"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum PipelineStatus {
    Completed,
    /// Ran to completion but no correspondence survived matching
    NoMatches,
    Failed { stage: Stage, message: String },
}

/// Counts gathered before a pipeline stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialCounts {
    pub n_keypoints1: usize,
    pub n_keypoints2: usize,
}

/// `100 * inliers / matches`, absent when there are no matches
pub fn inlier_ratio(n_inliers: usize, n_matches: usize) -> Option<f64> {
    if n_matches == 0 {
        None
    } else {
        Some(100.0 * n_inliers as f64 / n_matches as f64)
    }
}

/// Outcome of one detector/descriptor pipeline
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineResult {
    pub name: String,
    pub metric: DistanceMetric,
    pub n_keypoints1: usize,
    pub n_keypoints2: usize,
    pub n_matches: usize,
    pub n_inliers: usize,
    pub n_outliers: usize,
    pub inlier_ratio: Option<f64>,
    pub elapsed_ms: f64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub status: PipelineStatus,
    pub correspondences: Vec<ClassifiedCorrespondence>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub keypoints1: Vec<Keypoint>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub keypoints2: Vec<Keypoint>,
}

impl PipelineResult {
    /// Result of a pipeline that ran every stage
    pub fn completed(
        name: &str,
        metric: DistanceMetric,
        keypoints1: Vec<Keypoint>,
        keypoints2: Vec<Keypoint>,
        correspondences: Vec<ClassifiedCorrespondence>,
        elapsed_ms: f64,
    ) -> Self {
        let n_matches = correspondences.len();
        let n_inliers = correspondences.iter().filter(|c| c.is_inlier()).count();
        let status = if n_matches == 0 {
            PipelineStatus::NoMatches
        } else {
            PipelineStatus::Completed
        };
        Self {
            name: name.to_string(),
            metric,
            n_keypoints1: keypoints1.len(),
            n_keypoints2: keypoints2.len(),
            n_matches,
            n_inliers,
            n_outliers: n_matches - n_inliers,
            inlier_ratio: inlier_ratio(n_inliers, n_matches),
            elapsed_ms,
            status,
            correspondences,
            keypoints1,
            keypoints2,
        }
    }

    /// Result of a pipeline that stopped at `stage`
    pub fn failed(
        name: &str,
        metric: DistanceMetric,
        counts: PartialCounts,
        stage: Stage,
        message: String,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            metric,
            n_keypoints1: counts.n_keypoints1,
            n_keypoints2: counts.n_keypoints2,
            n_matches: 0,
            n_inliers: 0,
            n_outliers: 0,
            inlier_ratio: None,
            elapsed_ms,
            status: PipelineStatus::Failed { stage, message },
            correspondences: Vec::new(),
            keypoints1: Vec::new(),
            keypoints2: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PipelineStatus::Failed { .. })
    }

    pub fn has_matches(&self) -> bool {
        self.n_matches > 0
    }

    pub fn inliers(&self) -> impl Iterator<Item = &ClassifiedCorrespondence> {
        self.correspondences.iter().filter(|c| c.is_inlier())
    }

    pub fn outliers(&self) -> impl Iterator<Item = &ClassifiedCorrespondence> {
        self.correspondences.iter().filter(|c| !c.is_inlier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, Correspondence, Point2};

    fn classified(classification: Classification) -> ClassifiedCorrespondence {
        ClassifiedCorrespondence {
            correspondence: Correspondence {
                query_index: 0,
                train_index: 0,
                a: Point2::new(0.0, 0.0),
                b: Point2::new(0.0, 0.0),
            },
            classification,
            reprojection_error: Some(0.0),
        }
    }

    #[test]
    fn test_inlier_ratio() {
        assert_eq!(inlier_ratio(0, 0), None);
        assert_eq!(inlier_ratio(0, 4), Some(0.0));
        assert_eq!(inlier_ratio(3, 4), Some(75.0));
    }

    #[test]
    fn test_completed_counts() {
        let result = PipelineResult::completed(
            "orb",
            DistanceMetric::Hamming,
            vec![Keypoint::new(0.0, 0.0); 5],
            vec![Keypoint::new(0.0, 0.0); 7],
            vec![
                classified(Classification::Inlier),
                classified(Classification::Outlier),
                classified(Classification::Inlier),
            ],
            1.5,
        );
        assert_eq!(result.n_keypoints1, 5);
        assert_eq!(result.n_keypoints2, 7);
        assert_eq!(result.n_matches, 3);
        assert_eq!(result.n_inliers, 2);
        assert_eq!(result.n_outliers, 1);
        assert_eq!(result.inliers().count(), 2);
        assert_eq!(result.outliers().count(), 1);
        assert_eq!(result.status, PipelineStatus::Completed);
    }

    #[test]
    fn test_zero_matches_has_no_ratio() {
        let result =
            PipelineResult::completed("empty", DistanceMetric::Hamming, vec![], vec![], vec![], 0.1);
        assert_eq!(result.status, PipelineStatus::NoMatches);
        assert_eq!(result.inlier_ratio, None);
        assert!(!result.has_matches());
        assert!(!result.is_failed());
    }

    #[test]
    fn test_failed_keeps_partial_counts() {
        let result = PipelineResult::failed(
            "broken",
            DistanceMetric::Euclidean,
            PartialCounts {
                n_keypoints1: 12,
                n_keypoints2: 0,
            },
            Stage::Describe,
            "boom".to_string(),
            2.0,
        );
        assert!(result.is_failed());
        assert_eq!(result.n_keypoints1, 12);
        assert_eq!(result.n_matches, 0);
        assert_eq!(result.n_inliers + result.n_outliers, result.n_matches);
        assert_eq!(result.inlier_ratio, None);
    }
}
