use crate::error::FeatureResult;
use hmatch_core::Image;
use rayon::prelude::*;

/// Image smoothing and sampling shared by the descriptors
pub struct ImagePreprocessing;

impl ImagePreprocessing {
    /// Mean filter over a `(2r+1)x(2r+1)` window, borders clamped to the image
    pub fn box_blur(img: &Image, radius: usize) -> FeatureResult<Image> {
        if radius == 0 {
            return Ok(img.clone());
        }
        let (width, height) = img.dimensions();
        let integral = Self::integral_image(img);
        let stride = width + 1;

        let pixels: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                let y0 = y.saturating_sub(radius);
                let y1 = (y + radius + 1).min(height);
                let integral = &integral;
                (0..width).map(move |x| {
                    let x0 = x.saturating_sub(radius);
                    let x1 = (x + radius + 1).min(width);
                    let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                        - integral[y0 * stride + x1]
                        - integral[y1 * stride + x0];
                    let area = ((x1 - x0) * (y1 - y0)) as u64;
                    ((sum + area / 2) / area) as u8
                })
            })
            .collect();

        Ok(Image::new(width, height, pixels)?)
    }

    /// Summed-area table with a zero first row and column
    fn integral_image(img: &Image) -> Vec<u64> {
        let (width, height) = img.dimensions();
        let stride = width + 1;
        let mut integral = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += img.get(x, y) as u64;
                integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
            }
        }
        integral
    }

    /// Bilinear interpolation at fractional coordinates, clamped to the image
    pub fn bilinear_sample(img: &Image, x: f32, y: f32) -> f32 {
        let (width, height) = img.dimensions();
        let x = x.clamp(0.0, (width - 1) as f32);
        let y = y.clamp(0.0, (height - 1) as f32);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);

        let dx = x - x0 as f32;
        let dy = y - y0 as f32;

        let p00 = img.get(x0, y0) as f32;
        let p10 = img.get(x1, y0) as f32;
        let p01 = img.get(x0, y1) as f32;
        let p11 = img.get(x1, y1) as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}
