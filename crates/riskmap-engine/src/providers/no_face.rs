//! Provider that never finds a face
//!
//! Drives the fallback path without a detector.

use crate::provider::{Detection, ImageFrame, LandmarkProvider};

pub struct NoFaceProvider {
    reason: String,
}

impl NoFaceProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for NoFaceProvider {
    fn default() -> Self {
        Self::new("No face detected")
    }
}

impl LandmarkProvider for NoFaceProvider {
    fn name(&self) -> &str {
        "no-face"
    }

    fn detect(&self, _image: &ImageFrame) -> Detection {
        Detection::Failed {
            error: self.reason.clone(),
        }
    }
}
