//! Built-in detector/descriptor capabilities: FAST corners described by
//! steered BRIEF (full resolution or image pyramid) or by a float patch.

pub mod brief;
pub mod detector;
pub mod error;
pub mod extractors;
pub mod patch;
pub mod preprocessing;
pub mod pyramid;
pub mod types;
pub mod utils;

pub use brief::BriefDescriptor;
pub use detector::{FastConfig, FastDetector};
pub use error::{FeatureError, FeatureResult};
pub use extractors::{build_extractor, OrbExtractor, PatchExtractor, PyramidOrbExtractor};
pub use patch::PatchDescriptor;
pub use preprocessing::ImagePreprocessing;
pub use pyramid::ImagePyramid;
pub use types::{ScaleLevel, ScoredKeypoint};
