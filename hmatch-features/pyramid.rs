use crate::error::{FeatureError, FeatureResult};
use crate::preprocessing::ImagePreprocessing;
use crate::types::ScaleLevel;
use hmatch_core::Image;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Scale levels from full resolution down, stopping before a side drops below `min_size`
    pub fn generate_scale_levels(
        width: usize,
        height: usize,
        levels: usize,
        scale_factor: f32,
        min_size: usize,
    ) -> FeatureResult<Vec<ScaleLevel>> {
        if levels == 0 {
            return Err(FeatureError::InvalidPyramid(
                "at least one level is required".to_string(),
            ));
        }
        if !(scale_factor > 1.0) || !scale_factor.is_finite() {
            return Err(FeatureError::InvalidPyramid(format!(
                "scale factor {} must be > 1",
                scale_factor
            )));
        }

        let mut scale_levels = Vec::with_capacity(levels);
        let mut current_scale = 1.0f32;

        for level in 0..levels {
            let scaled_width = ((width as f32) / current_scale).round() as usize;
            let scaled_height = ((height as f32) / current_scale).round() as usize;

            if scaled_width < min_size || scaled_height < min_size {
                break;
            }

            scale_levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
            });

            current_scale *= scale_factor;
        }

        Ok(scale_levels)
    }

    /// Build one image per scale level; level 0 is the input itself
    pub fn build_image_pyramid(img: &Image, scale_levels: &[ScaleLevel]) -> FeatureResult<Vec<Image>> {
        scale_levels
            .iter()
            .map(|scale_level| {
                if scale_level.level == 0 {
                    Ok(img.clone())
                } else {
                    Self::downsample_image(img, scale_level.width, scale_level.height)
                }
            })
            .collect()
    }

    /// Downsample image using bilinear interpolation
    fn downsample_image(img: &Image, target_width: usize, target_height: usize) -> FeatureResult<Image> {
        let (src_width, src_height) = img.dimensions();
        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        let mut downsampled = Vec::with_capacity(target_width * target_height);
        for y in 0..target_height {
            for x in 0..target_width {
                // sample at the source position of the target pixel centre
                let src_x = (x as f32 + 0.5) * x_ratio - 0.5;
                let src_y = (y as f32 + 0.5) * y_ratio - 0.5;
                let value = ImagePreprocessing::bilinear_sample(img, src_x, src_y);
                downsampled.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }

        Ok(Image::new(target_width, target_height, downsampled)?)
    }
}
