//! Face-proportional fallback templates for degraded operation

use crate::types::TreatmentArea;
use riskmap_core::{Result, RiskMapError};
use serde::{Deserialize, Serialize};

/// Penalty carried by the built-in templates
pub const BUILTIN_CONFIDENCE_PENALTY: f64 = 0.7;

/// One template point, positioned relative to an assumed centered face.
///
/// Offsets are fractions of the assumed face size, measured from its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePoint {
    pub label: String,
    #[serde(default)]
    pub x_offset: f64,
    #[serde(default)]
    pub y_offset: f64,
    #[serde(default, alias = "md_code")]
    pub code: Option<String>,
    #[serde(default)]
    pub depth: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default, alias = "volume_recommendation")]
    pub volume: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
}

impl TemplatePoint {
    fn builtin(
        label: &str,
        x_offset: f64,
        y_offset: f64,
        code: &str,
        depth: &str,
        technique: &str,
        volume: &str,
    ) -> Self {
        Self {
            label: label.to_string(),
            x_offset,
            y_offset,
            code: Some(code.to_string()),
            depth: Some(depth.to_string()),
            technique: Some(technique.to_string()),
            volume: Some(volume.to_string()),
            tool: None,
        }
    }
}

/// On-disk layout of `fallback_template.toml`
#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default = "default_penalty")]
    confidence_penalty: f64,
    #[serde(default)]
    point: Vec<TemplatePoint>,
}

fn default_penalty() -> f64 {
    0.5
}

/// Template used when no landmarks are available for an area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackTemplate {
    pub area: TreatmentArea,
    pub points: Vec<TemplatePoint>,
    /// Fraction of confidence removed relative to a landmark-based result
    pub confidence_penalty: f64,
    /// False for the built-in minimal safe default
    pub authored: bool,
}

impl FallbackTemplate {
    /// The minimal safe default for an area
    pub fn builtin(area: TreatmentArea) -> Self {
        let points = match area {
            TreatmentArea::Lips => vec![
                TemplatePoint::builtin(
                    "Upper Lip Center (Template)",
                    0.0,
                    0.1,
                    "LP2",
                    "dermal",
                    "linear threading",
                    "0.1-0.2 ml",
                ),
                TemplatePoint::builtin(
                    "Lower Lip Center (Template)",
                    0.0,
                    0.15,
                    "LP3",
                    "subcutaneous",
                    "linear threading",
                    "0.2-0.3 ml",
                ),
            ],
            TreatmentArea::Cheeks => vec![
                TemplatePoint::builtin(
                    "Left High Malar (Template)",
                    -0.12,
                    -0.05,
                    "CK1",
                    "supraperiosteal",
                    "bolus injection",
                    "0.3-0.5 ml",
                ),
                TemplatePoint::builtin(
                    "Right High Malar (Template)",
                    0.12,
                    -0.05,
                    "CK1",
                    "supraperiosteal",
                    "bolus injection",
                    "0.3-0.5 ml",
                ),
            ],
            TreatmentArea::Chin => vec![TemplatePoint::builtin(
                "Central Pogonion (Template)",
                0.0,
                0.25,
                "CH1",
                "supraperiosteal",
                "bolus injection",
                "0.3-0.8 ml",
            )],
            TreatmentArea::Forehead => vec![
                TemplatePoint::builtin(
                    "Left Medial Frontalis (Template)",
                    -0.08,
                    -0.15,
                    "FH2",
                    "muscle belly",
                    "intramuscular injection",
                    "4-6 units",
                ),
                TemplatePoint::builtin(
                    "Right Medial Frontalis (Template)",
                    0.08,
                    -0.15,
                    "FH2",
                    "muscle belly",
                    "intramuscular injection",
                    "4-6 units",
                ),
            ],
        };

        Self {
            area,
            points,
            confidence_penalty: BUILTIN_CONFIDENCE_PENALTY,
            authored: false,
        }
    }

    /// Parse an authored template
    pub fn from_toml_str(area: TreatmentArea, content: &str) -> Result<Self> {
        let file: TemplateFile = toml::from_str(content).map_err(|e| {
            RiskMapError::KnowledgeLoadError(format!(
                "Failed to parse {} fallback template: {}",
                area, e
            ))
        })?;

        if !(0.0..=1.0).contains(&file.confidence_penalty) {
            return Err(RiskMapError::KnowledgeLoadError(format!(
                "{} fallback template: confidence_penalty must be within [0, 1], got {}",
                area, file.confidence_penalty
            )));
        }
        if let Some(bad) = file
            .point
            .iter()
            .find(|p| !p.x_offset.is_finite() || !p.y_offset.is_finite())
        {
            return Err(RiskMapError::KnowledgeLoadError(format!(
                "{} fallback template: point '{}' has a non-finite offset",
                area, bad.label
            )));
        }

        Ok(Self {
            area,
            points: file.point,
            confidence_penalty: file.confidence_penalty,
            authored: true,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_cover_every_area() {
        for area in TreatmentArea::ALL {
            let template = FallbackTemplate::builtin(area);
            assert!(!template.is_empty(), "{} has no builtin points", area);
            assert!(!template.authored);
            assert_eq!(template.confidence_penalty, BUILTIN_CONFIDENCE_PENALTY);
        }
    }

    #[test]
    fn test_builtin_lips_offsets() {
        let template = FallbackTemplate::builtin(TreatmentArea::Lips);
        assert_eq!(template.points.len(), 2);
        assert_eq!(template.points[0].y_offset, 0.1);
        assert_eq!(template.points[1].code.as_deref(), Some("LP3"));
    }

    #[test]
    fn test_parse_authored_template() {
        let template = FallbackTemplate::from_toml_str(
            TreatmentArea::Chin,
            r#"
confidence_penalty = 0.6

[[point]]
label = "Pogonion (Template)"
y_offset = 0.24
md_code = "CH1"
volume = "0.5 ml"
"#,
        )
        .unwrap();
        assert!(template.authored);
        assert_eq!(template.confidence_penalty, 0.6);
        assert_eq!(template.points[0].x_offset, 0.0);
        assert_eq!(template.points[0].volume.as_deref(), Some("0.5 ml"));
    }

    #[test]
    fn test_penalty_defaults_and_bounds() {
        let template = FallbackTemplate::from_toml_str(TreatmentArea::Lips, "").unwrap();
        assert_eq!(template.confidence_penalty, 0.5);
        assert!(template.is_empty());

        let err = FallbackTemplate::from_toml_str(TreatmentArea::Lips, "confidence_penalty = 2.0");
        assert!(err.is_err());
    }
}
