//! Fallback degrader: template points when no landmarks are available

use crate::results::{InjectionPointResult, ResultSource};
use riskmap_core::{ImageSize, Point};
use riskmap_knowledge::FallbackTemplate;

/// Assumed face size as a fraction of the image
pub const ASSUMED_FACE_WIDTH: f64 = 0.3;
pub const ASSUMED_FACE_HEIGHT: f64 = 0.4;

/// Template points stay this far inside every edge
pub const EDGE_MARGIN_PX: f64 = 10.0;

/// Ceiling for template-based confidence
pub const TEMPLATE_CONFIDENCE: f64 = 0.3;
/// Confidence of the minimal safe response
pub const MINIMAL_CONFIDENCE: f64 = 0.1;

pub const FALLBACK_WARNINGS: [&str; 3] = [
    "Face landmarks not detected - using approximate template",
    "Results are approximate - manual verification required",
    "Consider retaking photo with better lighting/positioning",
];

pub const MINIMAL_WARNINGS: [&str; 2] = [
    "Automated detection failed - no template available",
    "Manual assessment required for treatment planning",
];

const POINT_WARNINGS: [&str; 2] = [
    "Template-based positioning - verification required",
    "Anatomical landmarks not detected",
];

/// Confidence assigned to template points: never above 0.3, never below 0.1
pub fn template_confidence(template: &FallbackTemplate) -> f64 {
    (1.0 - template.confidence_penalty).clamp(MINIMAL_CONFIDENCE, TEMPLATE_CONFIDENCE)
}

/// Whether the image leaves room for a point inside the edge margin
pub fn fits_template(size: ImageSize) -> bool {
    size.width_f() > 2.0 * EDGE_MARGIN_PX && size.height_f() > 2.0 * EDGE_MARGIN_PX
}

/// Scale face-proportional template offsets into pixels.
///
/// Returns `None` when the template is empty or the image is too small to
/// place points inside the edge margin; the caller then answers with the
/// minimal safe response.
pub fn degrade(template: &FallbackTemplate, size: ImageSize) -> Option<Vec<InjectionPointResult>> {
    if template.is_empty() || !fits_template(size) {
        return None;
    }

    let center = size.center();
    let face_width = size.width_f() * ASSUMED_FACE_WIDTH;
    let face_height = size.height_f() * ASSUMED_FACE_HEIGHT;
    let confidence = template_confidence(template);

    let points = template
        .points
        .iter()
        .map(|tp| {
            let raw = Point::new(
                center.x + tp.x_offset * face_width,
                center.y + tp.y_offset * face_height,
            );
            InjectionPointResult {
                label: format!("{} (approximated)", tp.label),
                position: size.clamp_with_margin(raw, EDGE_MARGIN_PX),
                code: tp.code.clone(),
                depth: tp.depth.clone(),
                technique: tp.technique.clone(),
                volume: tp.volume.clone(),
                tool: tp.tool.clone(),
                notes: None,
                confidence,
                warnings: POINT_WARNINGS.iter().map(|w| w.to_string()).collect(),
                source: ResultSource {
                    rule_kind: "fallback_template".to_string(),
                    id: None,
                },
            }
        })
        .collect();

    Some(points)
}
