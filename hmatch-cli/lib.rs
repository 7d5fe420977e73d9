//! Image loading, text/JSON reports and match visualisation for the `hmatch` binary.

use hmatch_core::{Image, PipelineResult, PipelineStatus};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub use hmatch_core::{self, BenchConfig, Homography};
pub use hmatch_eval::{self, BenchmarkRunner, ImagePair};

pub type CliError = Box<dyn std::error::Error>;
pub type CliResult<T> = Result<T, CliError>;

const KEYPOINT_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const INLIER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTLIER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Decode any format the `image` crate knows and convert it to 8-bit luma
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> CliResult<Image> {
    let path = path.as_ref();
    let gray = image::open(path)
        .map_err(|e| format!("failed to load {}: {}", path.display(), e))?
        .to_luma8();
    let (width, height) = gray.dimensions();
    Ok(Image::new(width as usize, height as usize, gray.into_raw())?)
}

/// Human-readable summary, one block per pipeline
pub struct Report<'a>(pub &'a [PipelineResult]);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in self.0 {
            writeln!(f, "== {} ({}) ==", result.name, result.metric)?;
            writeln!(
                f,
                "  keypoints:    {} / {}",
                result.n_keypoints1, result.n_keypoints2
            )?;
            match &result.status {
                PipelineStatus::Failed { stage, message } => {
                    writeln!(f, "  failed at {}: {}", stage, message)?;
                }
                PipelineStatus::Completed | PipelineStatus::NoMatches => {
                    writeln!(f, "  matches:      {}", result.n_matches)?;
                    writeln!(f, "  inliers:      {}", result.n_inliers)?;
                    writeln!(f, "  outliers:     {}", result.n_outliers)?;
                    match result.inlier_ratio {
                        Some(ratio) => writeln!(f, "  inlier ratio: {:.2}%", ratio)?,
                        None => writeln!(f, "  no matches found")?,
                    }
                }
            }
            writeln!(f, "  elapsed:      {:.2} ms", result.elapsed_ms)?;
        }
        Ok(())
    }
}

pub fn format_report(results: &[PipelineResult]) -> String {
    Report(results).to_string()
}

/// Results without keypoint lists, pretty-printed
pub fn write_json<P: AsRef<Path>>(path: P, results: &[PipelineResult]) -> CliResult<()> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Both images side by side with keypoints and classified correspondences
pub fn render_matches(images: &ImagePair, result: &PipelineResult) -> RgbImage {
    let (left, right) = (&images.left, &images.right);
    let offset = left.width();
    let width = (left.width() + right.width()) as u32;
    let height = left.height().max(right.height()) as u32;

    let mut canvas = RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let value = if x < offset {
            (y < left.height()).then(|| left.get(x, y))
        } else {
            (y < right.height()).then(|| right.get(x - offset, y))
        };
        let v = value.unwrap_or(0);
        Rgb([v, v, v])
    });

    let shift = offset as f32;
    for kp in &result.keypoints1 {
        let radius = (3.0 * kp.scale).round() as i32;
        draw_hollow_circle_mut(&mut canvas, (kp.x as i32, kp.y as i32), radius, KEYPOINT_COLOR);
    }
    for kp in &result.keypoints2 {
        let radius = (3.0 * kp.scale).round() as i32;
        draw_hollow_circle_mut(
            &mut canvas,
            ((kp.x + shift) as i32, kp.y as i32),
            radius,
            KEYPOINT_COLOR,
        );
    }

    // outliers first so inliers stay visible where lines cross
    for classified in result.outliers().chain(result.inliers()) {
        let c = &classified.correspondence;
        let color = if classified.is_inlier() {
            INLIER_COLOR
        } else {
            OUTLIER_COLOR
        };
        draw_line_segment_mut(
            &mut canvas,
            (c.a.x as f32, c.a.y as f32),
            (c.b.x as f32 + shift, c.b.y as f32),
            color,
        );
    }
    canvas
}

/// File-system friendly version of a pipeline name
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// One `<pipeline>.png` per pipeline that did not fail; returns the written paths.
///
/// Names that sanitize to the same stem get a `-2`, `-3`, ... suffix.
pub fn draw_results<P: AsRef<Path>>(
    dir: P,
    images: &ImagePair,
    results: &[PipelineResult],
) -> CliResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut used = HashSet::new();
    let mut written = Vec::new();
    for result in results.iter().filter(|r| !r.is_failed()) {
        let base = file_stem(&result.name);
        let mut stem = base.clone();
        let mut n = 1;
        while !used.insert(stem.clone()) {
            n += 1;
            stem = format!("{}-{}", base, n);
        }
        let path = dir.join(format!("{}.png", stem));
        render_matches(images, result).save(&path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmatch_core::{
        Classification, ClassifiedCorrespondence, Correspondence, DistanceMetric, Keypoint,
        PartialCounts, Point2, Stage,
    };

    fn completed() -> PipelineResult {
        let correspondence = |x: f64, classification| ClassifiedCorrespondence {
            correspondence: Correspondence {
                query_index: 0,
                train_index: 0,
                a: Point2::new(x, 4.0),
                b: Point2::new(x, 4.0),
            },
            classification,
            reprojection_error: Some(0.0),
        };
        PipelineResult::completed(
            "orb",
            DistanceMetric::Hamming,
            vec![Keypoint::new(4.0, 4.0); 3],
            vec![Keypoint::new(6.0, 5.0); 2],
            vec![
                correspondence(2.0, Classification::Inlier),
                correspondence(8.0, Classification::Outlier),
            ],
            3.25,
        )
    }

    fn failed() -> PipelineResult {
        PipelineResult::failed(
            "patch",
            DistanceMetric::Euclidean,
            PartialCounts {
                n_keypoints1: 7,
                n_keypoints2: 0,
            },
            Stage::Detect,
            "image too small".to_string(),
            0.5,
        )
    }

    fn images() -> ImagePair {
        ImagePair::new(
            Image::filled(20, 12, 100).unwrap(),
            Image::filled(16, 16, 50).unwrap(),
        )
    }

    #[test]
    fn test_report_lists_counts() {
        let report = format_report(&[completed(), failed()]);
        assert!(report.contains("== orb (hamming) =="));
        assert!(report.contains("keypoints:    3 / 2"));
        assert!(report.contains("matches:      2"));
        assert!(report.contains("inlier ratio: 50.00%"));
        assert!(report.contains("failed at detection: image too small"));
        assert!(report.contains("elapsed:      3.25 ms"));
    }

    #[test]
    fn test_report_without_matches() {
        let empty =
            PipelineResult::completed("blind", DistanceMetric::Hamming, vec![], vec![], vec![], 0.0);
        let report = format_report(&[empty]);
        assert!(report.contains("no matches found"));
        assert!(!report.contains("inlier ratio"));
    }

    #[test]
    fn test_render_side_by_side() {
        let canvas = render_matches(&images(), &completed());
        assert_eq!(canvas.dimensions(), (36, 16));
        // right image starts after the left one, area below the shorter image is black
        assert_eq!(canvas.get_pixel(30, 14), &Rgb([50, 50, 50]));
        assert_eq!(canvas.get_pixel(0, 14), &Rgb([0, 0, 0]));
        // inlier line from (2, 4) to (22, 4)
        assert_eq!(canvas.get_pixel(12, 4), &INLIER_COLOR);
    }

    #[test]
    fn test_json_skips_keypoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_json(&path, &[completed(), failed()]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["status"], "completed");
        assert_eq!(entries[0]["n_matches"], 2);
        assert!(entries[0].get("keypoints1").is_none());
        assert_eq!(entries[1]["status"], "failed");
        assert_eq!(entries[1]["stage"], "detect");
        assert!(entries[1]["inlier_ratio"].is_null());
    }

    #[test]
    fn test_draw_skips_failed_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let mut named = completed();
        named.name = "pyramid orb/1".to_string();
        let written = draw_results(dir.path(), &images(), &[named, failed()]).unwrap();
        assert_eq!(written, vec![dir.path().join("pyramid_orb_1.png")]);
        assert!(written[0].exists());
    }

    #[test]
    fn test_draw_keeps_colliding_names_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut spaced = completed();
        spaced.name = "a b".to_string();
        let mut underscored = completed();
        underscored.name = "a_b".to_string();
        let mut again = completed();
        again.name = "a/b".to_string();

        let written =
            draw_results(dir.path(), &images(), &[spaced, underscored, again]).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("a_b.png"),
                dir.path().join("a_b-2.png"),
                dir.path().join("a_b-3.png"),
            ]
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_load_gray_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let rgb = RgbImage::from_fn(5, 3, |x, _| Rgb([(x * 50) as u8; 3]));
        rgb.save(&path).unwrap();

        let img = load_gray_image(&path).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(img.get(4, 2), 200);
        assert!(load_gray_image(dir.path().join("missing.png")).is_err());
    }
}
