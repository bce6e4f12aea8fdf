//! Replays a detection captured from the detector service

use crate::provider::{Detection, ImageFrame, LandmarkProvider, RecordedDetection};
use log::debug;
use riskmap_core::Result;
use std::path::Path;

/// Returns the same recorded detection for every image
#[derive(Debug, Clone)]
pub struct RecordedProvider {
    detection: Detection,
}

impl RecordedProvider {
    pub fn new(detection: Detection) -> Self {
        Self { detection }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(Self::new(
            RecordedDetection::from_json_str(content)?.into_detection(),
        ))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl LandmarkProvider for RecordedProvider {
    fn name(&self) -> &str {
        "recorded"
    }

    fn detect(&self, image: &ImageFrame) -> Detection {
        debug!(
            "Replaying recorded detection for {}x{} image",
            image.size.width, image.size.height
        );
        self.detection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_detection() {
        let provider = RecordedProvider::from_json_str(
            r#"{"success": true, "landmarks": [[1.0, 2.0]], "confidence": 0.8}"#,
        )
        .unwrap();
        let first = provider.detect(&ImageFrame::new(100, 100));
        let second = provider.detect(&ImageFrame::new(200, 50));
        assert!(first.is_found());
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_missing_file() {
        assert!(RecordedProvider::from_file(Path::new("/nonexistent/detection.json")).is_err());
    }
}
