//! Rule kind and parameter definitions

use riskmap_core::RiskMapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Treatment areas the knowledge base is authored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentArea {
    Lips,
    Cheeks,
    Chin,
    Forehead,
}

impl TreatmentArea {
    pub const ALL: [TreatmentArea; 4] = [
        TreatmentArea::Lips,
        TreatmentArea::Cheeks,
        TreatmentArea::Chin,
        TreatmentArea::Forehead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentArea::Lips => "lips",
            TreatmentArea::Cheeks => "cheeks",
            TreatmentArea::Chin => "chin",
            TreatmentArea::Forehead => "forehead",
        }
    }
}

impl fmt::Display for TreatmentArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentArea {
    type Err = RiskMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        TreatmentArea::ALL
            .into_iter()
            .find(|a| a.as_str() == lowered)
            .ok_or_else(|| RiskMapError::UnsupportedArea {
                value: s.to_string(),
                allowed: TreatmentArea::ALL.iter().map(|a| a.to_string()).collect(),
            })
    }
}

/// Severity of a risk zone, ordered from least to most dangerous
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Moderate,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Offset expressed as a fraction of the face bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetPercent {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Horizontal offset for the mirrored counterpart of a bilateral rule,
    /// whichever side that is. Defaults to `-x` when absent.
    #[serde(default, alias = "x_right")]
    pub x_mirrored: Option<f64>,
}

impl OffsetPercent {
    pub fn mirrored_x(&self) -> f64 {
        self.x_mirrored.unwrap_or(-self.x)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x_mirrored.map_or(true, f64::is_finite)
    }
}

/// How the anchor polyline of a buffered line is drawn.
///
/// Only `curved_polyline` is special; any other authored value is straight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum LineShape {
    #[default]
    StraightLine,
    CurvedPolyline,
}

impl From<String> for LineShape {
    fn from(value: String) -> Self {
        match value.as_str() {
            "curved_polyline" => LineShape::CurvedPolyline,
            _ => LineShape::StraightLine,
        }
    }
}

/// Where a bone-contact point sits relative to its anchor.
///
/// Only `inward` is special; any other authored value keeps the anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BoneDirection {
    /// Nudged toward the face center
    #[default]
    Inward,
    /// Anchor position used as-is
    Surface,
}

impl From<String> for BoneDirection {
    fn from(value: String) -> Self {
        match value.as_str() {
            "inward" => BoneDirection::Inward,
            _ => BoneDirection::Surface,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorOffsetParams {
    pub anchors: Vec<String>,
    #[serde(default)]
    pub anchor_weights: Option<Vec<f64>>,
    #[serde(default)]
    pub offset_percent: OffsetPercent,
}

impl VectorOffsetParams {
    /// Weight for the anchor at `index` (1.0 when no weights are authored)
    pub fn weight(&self, index: usize) -> f64 {
        self.anchor_weights
            .as_ref()
            .and_then(|w| w.get(index).copied())
            .unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineBufferParams {
    pub anchors: Vec<String>,
    #[serde(default = "default_line_buffer")]
    pub buffer_px: f64,
    #[serde(default)]
    pub shape: LineShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleParams {
    pub anchors: Vec<String>,
    #[serde(default = "default_radius")]
    pub radius_px: f64,
    #[serde(default)]
    pub offset_percent: OffsetPercent,
    #[serde(default)]
    pub bilateral: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EllipseParams {
    pub anchors: Vec<String>,
    #[serde(default = "default_ellipse_width")]
    pub width: f64,
    #[serde(default = "default_ellipse_height")]
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonParams {
    pub anchors: Vec<String>,
    #[serde(default)]
    pub buffer_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonePointParams {
    pub anchors: Vec<String>,
    #[serde(default)]
    pub bone_direction: BoneDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskParams {
    pub anchors: Vec<String>,
}

fn default_line_buffer() -> f64 {
    5.0
}
fn default_radius() -> f64 {
    10.0
}
fn default_ellipse_width() -> f64 {
    20.0
}
fn default_ellipse_height() -> f64 {
    15.0
}

/// What a rule kind produces when interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutput {
    Point,
    Polygon,
}

/// The seven rule kinds, each with its own typed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Weighted anchor centroid shifted by a fraction of the face box
    LandmarkVectorOffset(VectorOffsetParams),
    /// Constant-width ribbon around an anchor polyline
    PolylineBufferFromLandmarks(PolylineBufferParams),
    /// 16-gon around each anchor, optionally mirrored left/right
    CircleAroundLandmark(CircleParams),
    /// 16-gon ellipse around the anchor centroid
    EllipseAroundLandmarks(EllipseParams),
    /// Anchors as vertices, optionally pushed outward
    PolygonFromLandmarks(PolygonParams),
    /// Bone-contact approximation from the first anchor
    BonePoint(BonePointParams),
    /// Closed anchor loop used verbatim
    MaskFromLandmarkLoop(MaskParams),
}

impl RuleKind {
    /// Wire names accepted in the `type` key
    pub const KNOWN_KINDS: [&'static str; 7] = [
        "landmark_vector_offset",
        "polyline_buffer_from_landmarks",
        "circle_around_landmark",
        "ellipse_around_landmarks",
        "polygon_from_landmarks",
        "bone_point",
        "mask_from_landmark_loop",
    ];

    pub fn is_known(kind: &str) -> bool {
        Self::KNOWN_KINDS.contains(&kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::LandmarkVectorOffset(_) => Self::KNOWN_KINDS[0],
            RuleKind::PolylineBufferFromLandmarks(_) => Self::KNOWN_KINDS[1],
            RuleKind::CircleAroundLandmark(_) => Self::KNOWN_KINDS[2],
            RuleKind::EllipseAroundLandmarks(_) => Self::KNOWN_KINDS[3],
            RuleKind::PolygonFromLandmarks(_) => Self::KNOWN_KINDS[4],
            RuleKind::BonePoint(_) => Self::KNOWN_KINDS[5],
            RuleKind::MaskFromLandmarkLoop(_) => Self::KNOWN_KINDS[6],
        }
    }

    pub fn anchors(&self) -> &[String] {
        match self {
            RuleKind::LandmarkVectorOffset(p) => &p.anchors,
            RuleKind::PolylineBufferFromLandmarks(p) => &p.anchors,
            RuleKind::CircleAroundLandmark(p) => &p.anchors,
            RuleKind::EllipseAroundLandmarks(p) => &p.anchors,
            RuleKind::PolygonFromLandmarks(p) => &p.anchors,
            RuleKind::BonePoint(p) => &p.anchors,
            RuleKind::MaskFromLandmarkLoop(p) => &p.anchors,
        }
    }

    pub fn output(&self) -> RuleOutput {
        match self {
            RuleKind::LandmarkVectorOffset(_) | RuleKind::BonePoint(_) => RuleOutput::Point,
            _ => RuleOutput::Polygon,
        }
    }

    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<(), String> {
        if self.anchors().is_empty() {
            return Err("rule has no anchors".to_string());
        }
        if let Some(blank) = self.anchors().iter().find(|a| a.trim().is_empty()) {
            return Err(format!("blank anchor name {:?}", blank));
        }

        match self {
            RuleKind::LandmarkVectorOffset(p) => {
                if let Some(weights) = &p.anchor_weights {
                    if weights.len() != p.anchors.len() {
                        return Err(format!(
                            "anchor_weights has {} entries for {} anchors",
                            weights.len(),
                            p.anchors.len()
                        ));
                    }
                    if weights.iter().any(|w| !w.is_finite()) {
                        return Err("anchor_weights must be finite".to_string());
                    }
                }
                check_offset(&p.offset_percent)
            }
            RuleKind::PolylineBufferFromLandmarks(p) => check_non_negative("buffer_px", p.buffer_px),
            RuleKind::CircleAroundLandmark(p) => {
                check_positive("radius_px", p.radius_px)?;
                check_offset(&p.offset_percent)
            }
            RuleKind::EllipseAroundLandmarks(p) => {
                check_positive("width", p.width)?;
                check_positive("height", p.height)
            }
            RuleKind::PolygonFromLandmarks(p) => check_non_negative("buffer_px", p.buffer_px),
            RuleKind::BonePoint(_) | RuleKind::MaskFromLandmarkLoop(_) => Ok(()),
        }
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a positive number, got {}", field, value))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be zero or positive, got {}", field, value))
    }
}

fn check_offset(offset: &OffsetPercent) -> Result<(), String> {
    if offset.is_finite() {
        Ok(())
    } else {
        Err("offset_percent must be finite".to_string())
    }
}
