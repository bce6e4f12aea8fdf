//! Provider registry
//!
//! Concrete landmark sources. Live detectors are out of process; these cover
//! replaying recorded detections and simulating detector failure.

pub mod no_face;
pub mod recorded;

use crate::provider::LandmarkProvider;
use riskmap_core::{Result, RiskMapError};
use std::path::Path;

/// Create a provider by name. `recorded` requires a detection file.
pub fn create_provider(name: &str, input: Option<&Path>) -> Result<Box<dyn LandmarkProvider>> {
    match (name, input) {
        ("recorded", Some(path)) => Ok(Box::new(recorded::RecordedProvider::from_file(path)?)),
        ("recorded", None) => Err(RiskMapError::ConfigError(
            "The recorded provider needs a detection file".to_string(),
        )),
        ("no-face", _) => Ok(Box::new(no_face::NoFaceProvider::default())),
        _ => Err(RiskMapError::ConfigError(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["recorded", "no-face"]
}
