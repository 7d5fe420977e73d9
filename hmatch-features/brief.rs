use crate::error::{FeatureError, FeatureResult};
use crate::preprocessing::ImagePreprocessing;
use hmatch_core::{BinaryDescriptor, Image, Keypoint};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;

const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_SIZE * 8;

/// Steered BRIEF: intensity comparisons of point pairs rotated by the keypoint angle
#[derive(Debug, Clone)]
pub struct BriefDescriptor {
    pairs: Vec<[(f32, f32); 2]>,
}

impl BriefDescriptor {
    /// Draw the 256 test pairs inside a disc of diameter `patch_size`
    pub fn new(patch_size: usize, seed: u64) -> FeatureResult<Self> {
        if patch_size % 2 == 0 || patch_size < 5 {
            return Err(FeatureError::InvalidPatchSize(patch_size));
        }

        let half = (patch_size / 2) as i32;
        let radius_sq = half * half;
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut sample = move || loop {
            let x = rng.gen_range(-half..=half);
            let y = rng.gen_range(-half..=half);
            // a disc stays inside the patch under any rotation
            if x * x + y * y <= radius_sq {
                return (x as f32, y as f32);
            }
        };

        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let p1 = sample();
            let p2 = sample();
            if p1 != p2 {
                pairs.push([p1, p2]);
            }
        }

        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[[(f32, f32); 2]] {
        &self.pairs
    }

    /// One descriptor per keypoint, in keypoint order.
    ///
    /// `img` should already be smoothed; the pattern is scaled by `kp.scale`.
    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> Vec<BinaryDescriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (s, c) = (s * kp.scale, c * kp.scale);
                let mut d = [0u8; DESCRIPTOR_SIZE];

                for (i, &[(dx1, dy1), (dx2, dy2)]) in self.pairs.iter().enumerate() {
                    let val1 = ImagePreprocessing::bilinear_sample(
                        img,
                        kp.x + c * dx1 - s * dy1,
                        kp.y + s * dx1 + c * dy1,
                    );
                    let val2 = ImagePreprocessing::bilinear_sample(
                        img,
                        kp.x + c * dx2 - s * dy2,
                        kp.y + s * dx2 + c * dy2,
                    );

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }
}
