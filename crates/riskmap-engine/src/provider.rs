//! Landmark provider trait and detection types
//!
//! The detector itself lives outside this crate. Anything that can turn an
//! image into a face mesh implements [`LandmarkProvider`].

use crate::landmarks::LandmarkMesh;
use riskmap_core::{ImageSize, Point, Result, RiskMapError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An already-decoded image handed to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub size: ImageSize,
    /// Where the pixels came from, if known
    pub source: Option<PathBuf>,
}

impl ImageFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: ImageSize::new(width, height),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Outcome of running landmark detection on one image
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Found { mesh: LandmarkMesh, confidence: f64 },
    Failed { error: String },
}

impl Detection {
    pub fn is_found(&self) -> bool {
        matches!(self, Detection::Found { .. })
    }
}

/// JSON shape of a detection as recorded from the detector service:
/// `{"success": true, "landmarks": [[x, y], ...], "confidence": 0.93}` or
/// `{"success": false, "error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedDetection {
    pub success: bool,
    #[serde(default)]
    pub landmarks: Vec<[f64; 2]>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub error: Option<String>,
}

impl RecordedDetection {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn into_detection(self) -> Detection {
        if self.success {
            Detection::Found {
                mesh: LandmarkMesh::from_pairs(&self.landmarks),
                confidence: self.confidence,
            }
        } else {
            Detection::Failed {
                error: self
                    .error
                    .unwrap_or_else(|| "No face detected".to_string()),
            }
        }
    }
}

impl From<&Detection> for RecordedDetection {
    fn from(detection: &Detection) -> Self {
        match detection {
            Detection::Found { mesh, confidence } => Self {
                success: true,
                landmarks: mesh.points().iter().map(Point::to_array).collect(),
                confidence: *confidence,
                error: None,
            },
            Detection::Failed { error } => Self {
                success: false,
                landmarks: Vec::new(),
                confidence: 0.0,
                error: Some(error.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable(String),
}

/// Trait implemented by each landmark source
pub trait LandmarkProvider: Send + Sync {
    /// Provider name (e.g. "recorded", "no-face")
    fn name(&self) -> &str;

    /// Check whether the provider can serve requests
    fn health_check(&self) -> ProviderStatus {
        ProviderStatus::Available
    }

    /// Detect a face mesh. Failures are reported as [`Detection::Failed`],
    /// never as errors, so the caller can degrade instead of aborting.
    fn detect(&self, image: &ImageFrame) -> Detection;
}

/// Reject meshes the normalizer cannot work with
pub(crate) fn check_mesh(mesh: &LandmarkMesh) -> Result<()> {
    if mesh.is_empty() {
        return Err(RiskMapError::InvalidLandmarks("mesh is empty".to_string()));
    }
    if let Some(index) = mesh.points().iter().position(|p| !p.is_finite()) {
        return Err(RiskMapError::InvalidLandmarks(format!(
            "landmark {} has a non-finite coordinate",
            index
        )));
    }
    Ok(())
}
