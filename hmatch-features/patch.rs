use crate::error::{FeatureError, FeatureResult};
use crate::preprocessing::ImagePreprocessing;
use hmatch_core::{DescriptorSet, Image, Keypoint};
use rayon::prelude::*;

/// Rotated, zero-mean, unit-norm intensity patch compared under Euclidean distance
#[derive(Debug, Clone)]
pub struct PatchDescriptor {
    grid: usize,
    radius: f32,
}

impl PatchDescriptor {
    pub fn new(grid: usize, radius: f32) -> FeatureResult<Self> {
        if grid < 2 {
            return Err(FeatureError::InvalidDescriptor(format!(
                "grid {} must be at least 2",
                grid
            )));
        }
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(FeatureError::InvalidDescriptor(format!(
                "radius {} must be positive",
                radius
            )));
        }
        Ok(Self { grid, radius })
    }

    pub fn dimension(&self) -> usize {
        self.grid * self.grid
    }

    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> FeatureResult<DescriptorSet> {
        let dim = self.dimension();
        let step = 2.0 * self.radius / (self.grid - 1) as f32;

        let rows: Vec<Vec<f32>> = kps
            .par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let mut v = Vec::with_capacity(dim);
                for gy in 0..self.grid {
                    let oy = (-self.radius + gy as f32 * step) * kp.scale;
                    for gx in 0..self.grid {
                        let ox = (-self.radius + gx as f32 * step) * kp.scale;
                        v.push(ImagePreprocessing::bilinear_sample(
                            img,
                            kp.x + c * ox - s * oy,
                            kp.y + s * ox + c * oy,
                        ));
                    }
                }
                Self::normalize(&mut v);
                v
            })
            .collect();

        Ok(DescriptorSet::float(dim, rows.concat())?)
    }

    /// Zero mean, unit L2 norm; flat patches become all zeros
    fn normalize(v: &mut [f32]) {
        let mean = v.iter().sum::<f32>() / v.len() as f32;
        v.iter_mut().for_each(|x| *x -= mean);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-6 {
            v.iter_mut().for_each(|x| *x /= norm);
        } else {
            v.iter_mut().for_each(|x| *x = 0.0);
        }
    }
}
