use crate::error::{CoreError, CoreResult};
use crate::types::Point2;
use nalgebra::{Matrix3, Vector3};
use std::path::Path;

/// Below this the homogeneous scale is treated as a point at infinity
const W_EPSILON: f64 = 1e-12;
/// Determinant threshold of the max-normalized matrix
const SINGULAR_EPSILON: f64 = 1e-12;

/// Ground-truth 3x3 projective transform from image A to image B
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Build from nine row-major values
    pub fn from_row_major(values: [f64; 9]) -> CoreResult<Self> {
        Self::from_matrix(Matrix3::from_row_slice(&values))
    }

    pub fn from_matrix(m: Matrix3<f64>) -> CoreResult<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidHomography(
                "matrix contains non-finite values".to_string(),
            ));
        }
        let scale = m.amax();
        if scale == 0.0 || (m / scale).determinant().abs() < SINGULAR_EPSILON {
            return Err(CoreError::InvalidHomography("matrix is singular".to_string()));
        }
        Ok(Self { m })
    }

    /// Parse nine whitespace- or comma-separated numbers, row-major.
    /// Lines starting with `#` are ignored.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let mut values = Vec::with_capacity(9);
        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            for token in line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
            {
                let value: f64 = token.parse().map_err(|_| {
                    CoreError::InvalidHomography(format!("'{}' is not a number", token))
                })?;
                values.push(value);
            }
        }

        let values: [f64; 9] = values.as_slice().try_into().map_err(|_| {
            CoreError::InvalidHomography(format!("expected 9 values, found {}", values.len()))
        })?;
        Self::from_row_major(values)
    }

    /// Load a homography file (Oxford `H1to2p` layout)
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Map `p` through the homography; `None` for points at infinity
    pub fn project(&self, p: Point2) -> Option<Point2> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        let w = v.z;
        if !w.is_finite() || w.abs() < W_EPSILON {
            return None;
        }
        let projected = Point2::new(v.x / w, v.y / w);
        if projected.x.is_finite() && projected.y.is_finite() {
            Some(projected)
        } else {
            None
        }
    }

    /// Distance between the projection of `a` and the observed `b`
    pub fn reprojection_error(&self, a: Point2, b: Point2) -> Option<f64> {
        self.project(a).map(|p| p.distance(&b))
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const OXFORD_GRAF_H1TO2: &str = "
  8.7976964e-01   3.1245438e-01  -3.9430589e+01
 -1.8389418e-01   9.3847198e-01   1.5315784e+02
  1.9641425e-04  -1.6015275e-05   1.0000000e+00
";

    #[test]
    fn test_parse_oxford_layout() {
        let h = Homography::parse(OXFORD_GRAF_H1TO2).unwrap();
        assert_relative_eq!(h.matrix()[(0, 0)], 0.87976964, epsilon = 1e-12);
        assert_relative_eq!(h.matrix()[(1, 2)], 153.15784, epsilon = 1e-9);
        assert_relative_eq!(h.matrix()[(2, 2)], 1.0);
    }

    #[test]
    fn test_parse_commas_and_comments() {
        let h = Homography::parse("# identity\n1,0,0\n0,1,0\n0,0,1\n").unwrap();
        assert_eq!(h, Homography::identity());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Homography::parse("1 0 0 0 1 0 0 0"),
            Err(CoreError::InvalidHomography(_))
        ));
        assert!(matches!(
            Homography::parse("1 0 0 0 1 0 0 0 1 0"),
            Err(CoreError::InvalidHomography(_))
        ));
        assert!(matches!(
            Homography::parse("1 0 0 0 one 0 0 0 1"),
            Err(CoreError::InvalidHomography(_))
        ));
        assert!(matches!(
            Homography::parse("1 0 0 0 NaN 0 0 0 1"),
            Err(CoreError::InvalidHomography(_))
        ));
        assert!(matches!(Homography::parse(""), Err(CoreError::InvalidHomography(_))));
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let result = Homography::from_row_major([1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert!(matches!(result, Err(CoreError::InvalidHomography(_))));
        assert!(Homography::from_row_major([0.0; 9]).is_err());
    }

    #[test]
    fn test_small_scale_is_not_singular() {
        let h = Homography::from_row_major([1e-6, 0.0, 0.0, 0.0, 1e-6, 0.0, 0.0, 0.0, 1e-6]);
        assert!(h.is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Homography::load("/nonexistent/H1to2p");
        assert!(matches!(result, Err(CoreError::Io { .. })));
    }

    #[test]
    fn test_project_translation_and_scale() {
        let h = Homography::from_row_major([2.0, 0.0, 10.0, 0.0, 2.0, -5.0, 0.0, 0.0, 1.0]).unwrap();
        let p = h.project(Point2::new(3.0, 4.0)).unwrap();
        assert_relative_eq!(p.x, 16.0);
        assert_relative_eq!(p.y, 3.0);
    }

    #[test]
    fn test_project_divides_by_w() {
        let h = Homography::from_row_major([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0]).unwrap();
        let p = h.project(Point2::new(4.0, 6.0)).unwrap();
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 3.0);
    }

    #[test]
    fn test_point_at_infinity() {
        // w = x - 1 vanishes on the line x = 1
        let h = Homography::from_row_major([0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0]).unwrap();
        assert_eq!(h.project(Point2::new(1.0, 7.0)), None);
        assert_eq!(h.reprojection_error(Point2::new(1.0, 7.0), Point2::new(0.0, 0.0)), None);
        assert!(h.project(Point2::new(2.0, 7.0)).is_some());
    }

    #[test]
    fn test_reprojection_error_identity() {
        let h = Homography::identity();
        let err = h
            .reprojection_error(Point2::new(0.0, 0.0), Point2::new(5.0, 5.0))
            .unwrap();
        assert_relative_eq!(err, 50f64.sqrt());
    }

    proptest! {
        #[test]
        fn prop_inverse_projection_returns_point(
            a in 0.5f64..2.0,
            b in -0.3f64..0.3,
            tx in -100.0f64..100.0,
            ty in -100.0f64..100.0,
            x in -300.0f64..300.0,
            y in -300.0f64..300.0,
        ) {
            let h = Homography::from_row_major([a, b, tx, -b, a, ty, 0.0, 0.0, 1.0]).unwrap();
            let inverse = Homography::from_matrix(h.matrix().try_inverse().unwrap()).unwrap();
            let p = Point2::new(x, y);
            let back = inverse.project(h.project(p).unwrap()).unwrap();
            prop_assert!(back.distance(&p) < 1e-6);
        }
    }
}
