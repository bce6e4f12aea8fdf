//! Result types shared by the interpreter, validator and analyzer

use riskmap_core::{BoundingBox, Point};
use riskmap_knowledge::{InjectionPointDoc, RiskZoneDoc, Severity};
use serde::{Deserialize, Serialize};

/// Which rule produced a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSource {
    pub rule_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionPointResult {
    pub label: String,
    pub position: Point,
    pub code: Option<String>,
    pub depth: Option<String>,
    pub technique: Option<String>,
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub source: ResultSource,
}

impl InjectionPointResult {
    /// Attach a document's metadata to an interpreted position
    pub fn from_doc(doc: &InjectionPointDoc, position: Point, confidence: f64) -> Self {
        Self {
            label: doc.label.clone(),
            position,
            code: doc.code.clone(),
            depth: doc.depth.clone(),
            technique: doc.technique.clone(),
            volume: doc.volume_recommendation.clone(),
            tool: doc.tool.clone(),
            notes: doc.notes.clone(),
            confidence,
            warnings: doc.warnings.clone(),
            source: ResultSource {
                rule_kind: doc.rule.name().to_string(),
                id: doc.id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskZoneResult {
    pub name: String,
    /// Closed outline, at least three vertices
    pub polygon: Vec<Point>,
    pub severity: Severity,
    pub color: String,
    pub opacity: f64,
    pub safety_recommendations: Vec<String>,
    pub consequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_reference: Option<String>,
    /// Why the region is dangerous, as authored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub source: ResultSource,
}

impl RiskZoneResult {
    /// One result per polygon; names gain ` (n)` suffixes when a rule
    /// yields more than one.
    pub fn from_doc(doc: &RiskZoneDoc, polygons: &[Vec<Point>]) -> Vec<Self> {
        let numbered = polygons.len() > 1;
        polygons
            .iter()
            .enumerate()
            .map(|(i, polygon)| Self {
                name: if numbered {
                    format!("{} ({})", doc.name, i + 1)
                } else {
                    doc.name.clone()
                },
                polygon: polygon.clone(),
                severity: doc.severity,
                color: doc.color.clone(),
                opacity: doc.opacity,
                safety_recommendations: doc.safety_recommendations.clone(),
                consequences: doc.consequences.clone(),
                tooltip: doc.tooltip.clone(),
                medical_reference: doc.medical_reference.clone(),
                rationale: doc.rationale.clone(),
                style: doc.style.clone(),
                source: ResultSource {
                    rule_kind: doc.rule.name().to_string(),
                    id: doc.id.clone(),
                },
            })
            .collect()
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskmap_knowledge::{CircleParams, OffsetPercent, RuleKind};

    #[test]
    fn test_multi_polygon_zone_names() {
        let doc = RiskZoneDoc {
            id: Some("alar_artery".to_string()),
            name: "Angular Artery".to_string(),
            rule: RuleKind::CircleAroundLandmark(CircleParams {
                anchors: vec!["left_alae".to_string()],
                radius_px: 8.0,
                offset_percent: OffsetPercent::default(),
                bilateral: true,
            }),
            severity: Severity::Critical,
            color: "#FF0000".to_string(),
            opacity: 0.3,
            safety_recommendations: Vec::new(),
            consequences: vec!["Skin necrosis".to_string()],
            tooltip: None,
            medical_reference: None,
            rationale: Some("Retrograde flow to the ophthalmic artery".to_string()),
            style: None,
        };
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];

        let zones = RiskZoneResult::from_doc(&doc, &[square.clone(), square.clone()]);
        assert_eq!(zones[0].name, "Angular Artery (1)");
        assert_eq!(zones[1].name, "Angular Artery (2)");
        assert_eq!(zones[1].source.rule_kind, "circle_around_landmark");
        assert_eq!(
            zones[1].rationale.as_deref(),
            Some("Retrograde flow to the ophthalmic artery")
        );

        let single = RiskZoneResult::from_doc(&doc, &[square]);
        assert_eq!(single[0].name, "Angular Artery");
    }
}
