use crate::error::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Image-plane position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Key-point ≙ detector position (subpixel) + orientation, scale and response
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians
    pub angle: f32,
    /// Pyramid scale the keypoint was found at (1.0 = full resolution)
    pub scale: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            scale: 1.0,
            response: 0.0,
        }
    }

    pub fn point(&self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// Row-major 8-bit grayscale image
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidImageSize { width, height });
        }
        let expected_len = width * height;
        if pixels.len() != expected_len {
            return Err(CoreError::InvalidImageData {
                expected_len,
                actual_len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniform image, mostly useful for tests
    pub fn filled(width: usize, height: usize, value: u8) -> CoreResult<Self> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at (x, y); panics when out of bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }
}

/// 256-bit binary descriptor = 32 bytes
pub type BinaryDescriptor = [u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DistanceMetric {
    Euclidean,
    Hamming,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::Hamming => write!(f, "hamming"),
        }
    }
}

/// Descriptors of one image, index-aligned with its keypoints
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorSet {
    Binary(Vec<BinaryDescriptor>),
    /// `data.len() / dim` vectors of `dim` floats, stored contiguously
    Float { dim: usize, data: Vec<f32> },
}

impl DescriptorSet {
    pub fn float(dim: usize, data: Vec<f32>) -> CoreResult<Self> {
        let set = DescriptorSet::Float { dim, data };
        set.validate()?;
        Ok(set)
    }

    /// Float data must hold whole rows of a non-zero dimension
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            DescriptorSet::Float { dim, data } if *dim == 0 || data.len() % dim != 0 => {
                Err(CoreError::InvalidDescriptorData {
                    dim: *dim,
                    len: data.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Number of whole descriptors; 0 for a zero-dimension float set
    pub fn len(&self) -> usize {
        match self {
            DescriptorSet::Binary(d) => d.len(),
            DescriptorSet::Float { dim, data } => data.len().checked_div(*dim).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metric the descriptor kind is designed for
    pub fn natural_metric(&self) -> DistanceMetric {
        match self {
            DescriptorSet::Binary(_) => DistanceMetric::Hamming,
            DescriptorSet::Float { .. } => DistanceMetric::Euclidean,
        }
    }

    pub fn float_row(&self, index: usize) -> Option<&[f32]> {
        match self {
            DescriptorSet::Float { dim, data } => data.get(index * dim..(index + 1) * dim),
            DescriptorSet::Binary(_) => None,
        }
    }
}

/// Keypoints paired 1:1 with their descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    keypoints: Vec<Keypoint>,
    descriptors: DescriptorSet,
}

impl Features {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: DescriptorSet) -> CoreResult<Self> {
        descriptors.validate()?;
        if keypoints.len() != descriptors.len() {
            return Err(CoreError::DescriptorCountMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn point(&self, index: usize) -> Point2 {
        self.keypoints[index].point()
    }

    pub fn into_keypoints(self) -> Vec<Keypoint> {
        self.keypoints
    }
}

/// One neighbor in the train image found by the matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub point: Point2,
    pub distance: f32,
}

/// The two nearest train descriptors of one query descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub query_index: usize,
    pub query: Point2,
    pub best: Neighbor,
    /// Absent when the train image holds a single descriptor
    pub second: Option<Neighbor>,
}

/// Accepted point pair between image A and image B
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub query_index: usize,
    pub train_index: usize,
    pub a: Point2,
    pub b: Point2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Classification {
    Inlier,
    Outlier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifiedCorrespondence {
    pub correspondence: Correspondence,
    pub classification: Classification,
    /// `None` when `a` projects to infinity
    pub reprojection_error: Option<f64>,
}

impl ClassifiedCorrespondence {
    pub fn is_inlier(&self) -> bool {
        self.classification == Classification::Inlier
    }
}
