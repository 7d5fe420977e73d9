use crate::error::{FeatureError, FeatureResult};
use crate::types::ScoredKeypoint;
use crate::utils::{circle_mask, has_consecutive_bits};
use hmatch_core::{Image, Keypoint};
use rayon::prelude::*;

/// Bresenham circle of radius 3 around the candidate pixel
const CIRCLE: [(i32, i32); 16] = [
    (0, -3), (1, -3), (2, -2), (3, -1),
    (3, 0), (3, 1), (2, 2), (1, 3),
    (0, 3), (-1, 3), (-2, 2), (-3, 1),
    (-3, 0), (-3, -1), (-2, -2), (-1, -3),
];

/// FAST-9: nine contiguous circle pixels brighter or darker than the centre
const ARC_LENGTH: usize = 9;

/// FAST requires at least 7x7 image (3-pixel border on each side)
pub const MIN_IMAGE_SIZE: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct FastConfig {
    pub threshold: u8,
    /// Side of the square window used for the intensity-centroid orientation
    pub patch_size: usize,
    pub nms_distance: f32,
    pub max_keypoints: usize,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            nms_distance: 3.0,
            max_keypoints: 1500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: FastConfig,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: FastConfig) -> FeatureResult<Self> {
        // 0 would accept every pixel
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FeatureError::InvalidThreshold(cfg.threshold));
        }
        if cfg.patch_size % 2 == 0 || cfg.patch_size < 3 {
            return Err(FeatureError::InvalidPatchSize(cfg.patch_size));
        }
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &FastConfig {
        &self.cfg
    }

    /// Strongest corners after non-maximum suppression, at most `max_keypoints`
    pub fn detect_keypoints(&self, img: &Image) -> FeatureResult<Vec<Keypoint>> {
        let scored = self.detect_keypoints_with_response(img)?;
        let kept = Self::non_maximum_suppression(scored, self.cfg.nms_distance, self.cfg.max_keypoints);
        Ok(kept.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Every pixel passing the segment test, in row-major order
    pub fn detect_keypoints_with_response(&self, img: &Image) -> FeatureResult<Vec<ScoredKeypoint>> {
        let (w, h) = img.dimensions();
        if w < MIN_IMAGE_SIZE || h < MIN_IMAGE_SIZE {
            return Err(FeatureError::ImageTooSmall {
                width: w,
                height: h,
                min_size: MIN_IMAGE_SIZE,
            });
        }

        let threshold = self.cfg.threshold;
        let keypoints = (3..h - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut v = Vec::new();
                for x in 3..w - 3 {
                    if let Some(response) = Self::segment_test(img, x, y, threshold) {
                        let angle = self.compute_orientation(img, x, y);
                        let mut keypoint = Keypoint::new(x as f32, y as f32);
                        keypoint.angle = angle;
                        keypoint.response = response;
                        v.push(ScoredKeypoint { keypoint, response });
                    }
                }
                v
            })
            .collect();

        Ok(keypoints)
    }

    /// Mean absolute contrast of the arc if (x, y) is a FAST-9 corner
    fn segment_test(img: &Image, x: usize, y: usize, threshold: u8) -> Option<f32> {
        let p = img.get(x, y) as i32;
        let bright_limit = p + threshold as i32;
        let dark_limit = p - threshold as i32;

        let mut bright = [false; 16];
        let mut dark = [false; 16];
        let mut bright_sum = 0i32;
        let mut dark_sum = 0i32;

        for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
            let q = img.get((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32;
            if q >= bright_limit {
                bright[i] = true;
                bright_sum += q - p;
            } else if q <= dark_limit {
                dark[i] = true;
                dark_sum += p - q;
            }
        }

        let bright_mask = circle_mask(&bright);
        let dark_mask = circle_mask(&dark);
        if has_consecutive_bits(bright_mask, ARC_LENGTH) {
            Some(bright_sum as f32 / bright_mask.count_ones() as f32)
        } else if has_consecutive_bits(dark_mask, ARC_LENGTH) {
            Some(dark_sum as f32 / dark_mask.count_ones() as f32)
        } else {
            None
        }
    }

    /// Intensity-centroid orientation over the in-bounds part of the patch
    fn compute_orientation(&self, img: &Image, x: usize, y: usize) -> f32 {
        let half = (self.cfg.patch_size / 2) as i64;
        let (w, h) = img.dimensions();
        let (cx, cy) = (x as i64, y as i64);

        let mut m10 = 0i64; // Use i64 to prevent overflow
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = cy + dy;
            if yy < 0 || yy >= h as i64 {
                continue;
            }
            for dx in -half..=half {
                let xx = cx + dx;
                if xx < 0 || xx >= w as i64 {
                    continue;
                }
                let val = img.get(xx as usize, yy as usize) as i64;
                m10 += dx * val;
                m01 += dy * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Greedy suppression by response (highest first), keeping at most `limit`
    pub fn non_maximum_suppression(
        mut keypoints: Vec<ScoredKeypoint>,
        min_distance: f32,
        limit: usize,
    ) -> Vec<ScoredKeypoint> {
        // stable sort keeps row-major order among equal responses
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let mut suppressed: Vec<ScoredKeypoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in keypoints {
            if suppressed.len() >= limit {
                break;
            }
            let is_local_maximum = suppressed.iter().all(|accepted| {
                let dx = candidate.keypoint.x - accepted.keypoint.x;
                let dy = candidate.keypoint.y - accepted.keypoint.y;
                dx * dx + dy * dy >= min_distance_sq
            });
            if is_local_maximum {
                suppressed.push(candidate);
            }
        }

        suppressed
    }
}
