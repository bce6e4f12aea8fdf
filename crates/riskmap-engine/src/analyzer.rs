//! Analysis pipeline
//!
//! detect -> normalize -> interpret rules -> validate -> score, or, when no
//! usable landmarks exist, the fallback template path. Every failure folds
//! into a smaller, flagged response; nothing here returns an error.

use crate::config::AnalysisSettings;
use crate::consistency::{ConsistencyChecker, ConsistencyOutcome};
use crate::fallback::{self, FALLBACK_WARNINGS, MINIMAL_CONFIDENCE, MINIMAL_WARNINGS};
use crate::interpreter::RuleInterpreter;
use crate::landmarks::{audit_anchors, LandmarkMesh};
use crate::measurements::FacialMeasurements;
use crate::normalizer::NormalizedFace;
use crate::provider::{Detection, ImageFrame, LandmarkProvider};
use crate::results::{InjectionPointResult, RiskZoneResult};
use crate::scorer::confidence_score;
use crate::validator::{dedup_zones, SafetyValidator};
use log::{debug, info, warn};
use riskmap_core::{AnalysisId, ContentHash, ContentHasher, ImageSize, Point};
use riskmap_knowledge::{AreaKnowledge, KnowledgeStore, TreatmentArea};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Discount applied to normalization confidence for rule-derived points
const RULE_CONFIDENCE_FACTOR: f64 = 0.9;

pub const DISCLAIMER: &str = "For trained medical professionals only. Not for patient consultation.";
pub const TEMPLATE_DISCLAIMER: &str =
    "TEMPLATE MODE: Approximate positioning only. Manual verification required.";
pub const MINIMAL_DISCLAIMER: &str = "FALLBACK MODE: For trained medical professionals only.";

/// What the caller wants back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisModes {
    #[serde(default = "default_true")]
    pub risk_zones: bool,
    #[serde(default = "default_true")]
    pub injection_points: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisModes {
    fn default() -> Self {
        Self {
            risk_zones: true,
            injection_points: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub area: TreatmentArea,
    #[serde(default)]
    pub modes: AnalysisModes,
}

impl AnalysisRequest {
    pub fn new(area: TreatmentArea) -> Self {
        Self {
            area,
            modes: AnalysisModes::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_id: AnalysisId,
    pub area: TreatmentArea,
    pub image_size: ImageSize,
    pub risk_zones: Vec<RiskZoneResult>,
    pub injection_points: Vec<InjectionPointResult>,
    pub confidence_score: f64,
    pub processing_time_ms: f64,
    /// Short hash of the analysis input (landmarks and area)
    pub deterministic_hash: String,
    pub fallback_used: bool,
    pub modes_applied: AnalysisModes,
    pub warnings: Vec<String>,
    pub medical_disclaimer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<FacialMeasurements>,
}

/// Shared, read-only analysis context.
///
/// Holds the knowledge store built at startup; `analyze` takes `&self` and may
/// run concurrently from many threads.
pub struct Analyzer {
    store: Arc<KnowledgeStore>,
    settings: AnalysisSettings,
    consistency: ConsistencyChecker,
}

impl Analyzer {
    pub fn new(store: Arc<KnowledgeStore>, settings: AnalysisSettings) -> Self {
        for issue in audit_anchors(&store) {
            warn!("Knowledge audit: {}", issue);
        }
        Self {
            store,
            settings,
            consistency: ConsistencyChecker::new(),
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Run detection through `provider`, then analyze the result
    pub fn analyze(
        &self,
        provider: &dyn LandmarkProvider,
        image: &ImageFrame,
        request: &AnalysisRequest,
    ) -> AnalysisResponse {
        debug!("Detecting landmarks with provider '{}'", provider.name());
        let detection = provider.detect(image);
        self.analyze_detection(detection, image.size, request)
    }

    /// Analyze an already-obtained detection
    pub fn analyze_detection(
        &self,
        detection: Detection,
        image_size: ImageSize,
        request: &AnalysisRequest,
    ) -> AnalysisResponse {
        let start = Instant::now();
        let mut warnings = Vec::new();

        if image_size.width > self.settings.max_image_size
            || image_size.height > self.settings.max_image_size
        {
            warnings.push(format!(
                "Image {}x{} exceeds the recommended maximum of {}px",
                image_size.width, image_size.height, self.settings.max_image_size
            ));
        }

        let mut response = match detection {
            Detection::Found { mesh, confidence } => {
                self.analyze_mesh(mesh, confidence, image_size, request, &mut warnings)
            }
            Detection::Failed { error } => {
                warn!("Landmark detection failed: {}", error);
                warnings.push(format!("Landmark detection failed: {}", error));
                self.fallback_response(image_size, request, &mut warnings)
            }
        };

        response.warnings = warnings;
        response.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Analysis {} for {}: {} zones, {} points, confidence {:.2}{}",
            response.analysis_id,
            request.area,
            response.risk_zones.len(),
            response.injection_points.len(),
            response.confidence_score,
            if response.fallback_used { " (fallback)" } else { "" }
        );
        response
    }

    fn analyze_mesh(
        &self,
        mesh: LandmarkMesh,
        detection_confidence: f64,
        image_size: ImageSize,
        request: &AnalysisRequest,
        warnings: &mut Vec<String>,
    ) -> AnalysisResponse {
        let face = match NormalizedFace::from_mesh(mesh, image_size, detection_confidence) {
            Ok(face) => face,
            Err(e) => {
                warn!("Unusable landmarks: {}", e);
                warnings.push(format!("Unusable landmarks: {}", e));
                return self.fallback_response(image_size, request, warnings);
            }
        };

        let Some(knowledge) = self.store.area(request.area) else {
            warn!("No rules loaded for area '{}'", request.area);
            warnings.push(format!(
                "No rules loaded for area '{}' - using approximate template",
                request.area
            ));
            return self.fallback_response(image_size, request, warnings);
        };

        let (points, zones) = self.apply_rules(&face, knowledge, request, warnings);
        let input_hash = ContentHash::from_points(face.landmarks.points(), request.area.as_str());

        if self.settings.enable_consistency_checks {
            self.check_consistency(input_hash, &points, &zones);
        }

        AnalysisResponse {
            analysis_id: AnalysisId::new(),
            area: request.area,
            image_size,
            confidence_score: confidence_score(
                face.detection_confidence,
                face.confidence,
                points.len(),
                zones.len(),
            ),
            risk_zones: zones,
            injection_points: points,
            processing_time_ms: 0.0,
            deterministic_hash: input_hash.to_short_hex(),
            fallback_used: false,
            modes_applied: request.modes,
            warnings: Vec::new(),
            medical_disclaimer: DISCLAIMER.to_string(),
            measurements: Some(FacialMeasurements::from_landmarks(&face.named)),
        }
    }

    /// Interpret, validate and filter one area's documents against a face
    fn apply_rules(
        &self,
        face: &NormalizedFace,
        knowledge: &AreaKnowledge,
        request: &AnalysisRequest,
        warnings: &mut Vec<String>,
    ) -> (Vec<InjectionPointResult>, Vec<RiskZoneResult>) {
        let interpreter = RuleInterpreter::new(face);
        let modes = request.modes;

        let need_zones = modes.risk_zones
            || (modes.injection_points && self.settings.validate_against_hidden_zones);
        let mut zones = Vec::new();
        if need_zones {
            for doc in &knowledge.risk_zones {
                let result = interpreter.interpret(&doc.rule);
                if let Some(warning) =
                    unresolved_warning("risk zone", &doc.name, &result.unresolved)
                {
                    warnings.push(warning);
                    continue;
                }
                if result.polygons().is_empty() {
                    warnings.push(format!("Skipped risk zone '{}': not enough anchors", doc.name));
                    continue;
                }
                zones.extend(RiskZoneResult::from_doc(doc, result.polygons()));
            }
        }

        let mut points = Vec::new();
        if modes.injection_points {
            let initial_confidence = face.confidence * RULE_CONFIDENCE_FACTOR;
            let mut candidates = Vec::with_capacity(knowledge.injection_points.len());
            for doc in &knowledge.injection_points {
                let result = interpreter.interpret(&doc.rule);
                if let Some(warning) =
                    unresolved_warning("injection point", &doc.label, &result.unresolved)
                {
                    warnings.push(warning);
                    continue;
                }
                match result.point() {
                    Some(position) => candidates.push(InjectionPointResult::from_doc(
                        doc,
                        position,
                        initial_confidence,
                    )),
                    None => warnings.push(format!(
                        "Skipped injection point '{}': could not be placed",
                        doc.label
                    )),
                }
            }
            points = SafetyValidator::for_area(request.area, face.image_size)
                .validate_points(candidates, &zones);
        }

        let zones = if !modes.risk_zones {
            Vec::new()
        } else if self.settings.dedup_zones {
            dedup_zones(zones)
        } else {
            zones
        };

        (points, zones)
    }

    fn check_consistency(
        &self,
        input: ContentHash,
        points: &[InjectionPointResult],
        zones: &[RiskZoneResult],
    ) {
        let geometry: Vec<Point> = points
            .iter()
            .map(|p| p.position)
            .chain(zones.iter().flat_map(|z| z.polygon.iter().copied()))
            .collect();
        if let ConsistencyOutcome::Drift { max_deviation_px } =
            self.consistency.check(input, &geometry)
        {
            debug!("Consistency drift of {:.3}px for {}", max_deviation_px, input);
        }
    }

    /// Template path; falls through to the minimal response when no usable
    /// template exists
    fn fallback_response(
        &self,
        image_size: ImageSize,
        request: &AnalysisRequest,
        warnings: &mut Vec<String>,
    ) -> AnalysisResponse {
        if !self.settings.enable_fallback {
            return self.minimal_response(image_size, request, warnings);
        }

        let Some(template) = self.store.fallback(request.area) else {
            return self.minimal_response(image_size, request, warnings);
        };
        let Some(template_points) = fallback::degrade(template, image_size) else {
            return self.minimal_response(image_size, request, warnings);
        };

        info!("Using fallback template for {}", request.area);
        warnings.extend(FALLBACK_WARNINGS.iter().map(|w| w.to_string()));

        let injection_points = if request.modes.injection_points {
            template_points
        } else {
            Vec::new()
        };

        let mut hasher = ContentHasher::new();
        hasher.update_str("fallback_template").update_str(request.area.as_str());

        AnalysisResponse {
            analysis_id: AnalysisId::new(),
            area: request.area,
            image_size,
            risk_zones: Vec::new(),
            injection_points,
            confidence_score: fallback::template_confidence(template),
            processing_time_ms: 0.0,
            deterministic_hash: hasher.finish().to_short_hex(),
            fallback_used: true,
            modes_applied: request.modes,
            warnings: Vec::new(),
            medical_disclaimer: TEMPLATE_DISCLAIMER.to_string(),
            measurements: None,
        }
    }

    fn minimal_response(
        &self,
        image_size: ImageSize,
        request: &AnalysisRequest,
        warnings: &mut Vec<String>,
    ) -> AnalysisResponse {
        warn!("Returning minimal safe response for {}", request.area);
        warnings.extend(MINIMAL_WARNINGS.iter().map(|w| w.to_string()));

        let mut hasher = ContentHasher::new();
        hasher.update_str("fallback").update_str(request.area.as_str());

        AnalysisResponse {
            analysis_id: AnalysisId::new(),
            area: request.area,
            image_size,
            risk_zones: Vec::new(),
            injection_points: Vec::new(),
            confidence_score: MINIMAL_CONFIDENCE,
            processing_time_ms: 0.0,
            deterministic_hash: hasher.finish().to_short_hex(),
            fallback_used: true,
            modes_applied: request.modes,
            warnings: Vec::new(),
            medical_disclaimer: MINIMAL_DISCLAIMER.to_string(),
            measurements: None,
        }
    }
}

/// A document with any unresolved anchor is skipped whole, never placed
/// from the anchors that happened to resolve
fn unresolved_warning(kind: &str, document: &str, unresolved: &[String]) -> Option<String> {
    if unresolved.is_empty() {
        return None;
    }
    warn!("Skipping {} '{}': unresolved anchors {}", kind, document, unresolved.join(", "));
    Some(format!(
        "Skipped {} '{}': unresolved anchors {}",
        kind,
        document,
        unresolved.join(", ")
    ))
}
