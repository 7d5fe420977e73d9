use hmatch_core::{Classification, ClassifiedCorrespondence, Correspondence, Homography};

/// Classify one correspondence by its reprojection error under `homography`.
///
/// A point at infinity is an outlier with no error. A zero error is an inlier
/// for any threshold, so exact projections survive `threshold == 0`.
pub fn classify(
    correspondence: Correspondence,
    homography: &Homography,
    threshold: f64,
) -> ClassifiedCorrespondence {
    let reprojection_error = homography.reprojection_error(correspondence.a, correspondence.b);
    let inlier = reprojection_error.is_some_and(|error| error < threshold || error == 0.0);
    ClassifiedCorrespondence {
        correspondence,
        classification: if inlier {
            Classification::Inlier
        } else {
            Classification::Outlier
        },
        reprojection_error,
    }
}

/// Classify every correspondence, keeping inliers and outliers in input order
pub fn classify_correspondences(
    correspondences: &[Correspondence],
    homography: &Homography,
    threshold: f64,
) -> Vec<ClassifiedCorrespondence> {
    correspondences
        .iter()
        .map(|&c| classify(c, homography, threshold))
        .collect()
}

pub fn count_inliers(classified: &[ClassifiedCorrespondence]) -> usize {
    classified.iter().filter(|c| c.is_inlier()).count()
}
