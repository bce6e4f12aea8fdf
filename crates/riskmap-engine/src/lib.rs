//! riskmap Engine - Landmarks in, clinical geometry out
//!
//! This crate turns a detected face mesh into injection points and risk-zone
//! polygons by interpreting declarative rule documents:
//! - `normalizer` - Named anchors, face bounds and a geometric confidence
//! - `interpreter` - The seven rule kinds as pure geometry
//! - `validator` - Clearance, spacing and per-area caps
//! - `fallback` - Template points when no landmarks are usable
//! - `analyzer` - The end-to-end pipeline tying these together

mod analyzer;
mod config;
mod consistency;
mod fallback;
mod interpreter;
mod landmarks;
mod measurements;
mod normalizer;
mod provider;
pub mod providers;
mod results;
mod scorer;
mod validator;

pub use analyzer::{
    AnalysisModes, AnalysisRequest, AnalysisResponse, Analyzer, DISCLAIMER, MINIMAL_DISCLAIMER,
    TEMPLATE_DISCLAIMER,
};
pub use config::{
    AnalysisSettings, RiskMapConfig, RiskMapConfigFile, ENV_ENABLE_FALLBACK, ENV_KNOWLEDGE_DIR,
    ENV_STRICT_RULE_KINDS,
};
pub use consistency::{ConsistencyChecker, ConsistencyOutcome, DEVIATION_TOLERANCE_PX};
pub use fallback::{
    degrade, template_confidence, FALLBACK_WARNINGS, MINIMAL_CONFIDENCE, MINIMAL_WARNINGS,
    TEMPLATE_CONFIDENCE,
};
pub use interpreter::{mirrored_name, Geometry, Interpretation, RuleInterpreter};
pub use landmarks::{
    audit_anchors, is_known_landmark, known_landmark_names, landmark_index, LandmarkMesh,
    NamedLandmarks, DERIVED_LANDMARKS, LANDMARK_INDEX, MESH_SIZE,
};
pub use measurements::{FacialMeasurements, ProportionCheck};
pub use normalizer::{normalization_confidence, NormalizedFace};
pub use provider::{
    Detection, ImageFrame, LandmarkProvider, ProviderStatus, RecordedDetection,
};
pub use results::{InjectionPointResult, ResultSource, RiskZoneResult};
pub use scorer::confidence_score;
pub use validator::{clearance_px, dedup_zones, SafetyPolicy, SafetyValidator};
