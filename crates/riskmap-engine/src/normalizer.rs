//! Face normalization: bounding box, named anchors and a plausibility score

use crate::landmarks::{landmark_index, LandmarkMesh, NamedLandmarks};
use crate::provider::check_mesh;
use riskmap_core::{BoundingBox, ImageSize, Point, Result, RiskMapError};

/// Meshes smaller than this are scored at the floor
pub const MIN_USABLE_LANDMARKS: usize = 100;

pub const MIN_CONFIDENCE: f64 = 0.1;

/// Spread (std-dev x + std-dev y) at which a detection counts as full-size
const SPREAD_FULL_FRACTION: f64 = 0.1;
/// Spread beyond which a detection is implausibly large
const SPREAD_MAX_FRACTION: f64 = 0.6;

/// A detected face in canonical form. Built once per request, read-only after.
#[derive(Debug, Clone)]
pub struct NormalizedFace {
    pub landmarks: LandmarkMesh,
    pub named: NamedLandmarks,
    pub face_bbox: BoundingBox,
    /// Normalization confidence in `[0.1, 1.0]`
    pub confidence: f64,
    /// Detector confidence as reported, clamped to `[0, 1]`
    pub detection_confidence: f64,
    /// No rotation or scale correction is performed; always false
    pub alignment_applied: bool,
    pub image_size: ImageSize,
}

impl NormalizedFace {
    /// Build a normalized face from a raw detection.
    ///
    /// Fails only on structurally unusable input (empty mesh, non-finite
    /// coordinates, zero-sized image).
    pub fn from_mesh(
        landmarks: LandmarkMesh,
        image_size: ImageSize,
        detection_confidence: f64,
    ) -> Result<Self> {
        if image_size.width == 0 || image_size.height == 0 {
            return Err(RiskMapError::InvalidLandmarks(
                "image has zero width or height".to_string(),
            ));
        }
        check_mesh(&landmarks)?;

        let named = NamedLandmarks::from_mesh(&landmarks);
        let face_bbox = BoundingBox::from_points(landmarks.points());
        let confidence = normalization_confidence(&landmarks, image_size);
        let detection_confidence = if detection_confidence.is_finite() {
            detection_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Self {
            landmarks,
            named,
            face_bbox,
            confidence,
            detection_confidence,
            alignment_applied: false,
            image_size,
        })
    }

    pub fn anchor(&self, name: &str) -> Option<Point> {
        self.named.get(name)
    }
}

/// Average of four plausibility factors, clamped to `[0.1, 1.0]`
pub fn normalization_confidence(mesh: &LandmarkMesh, image_size: ImageSize) -> f64 {
    if mesh.len() < MIN_USABLE_LANDMARKS {
        return MIN_CONFIDENCE;
    }

    let factors = [
        center_factor(mesh, image_size),
        spread_factor(mesh, image_size),
        proportion_factor(mesh, image_size),
        mesh.completeness(),
    ];
    let mean = factors.iter().sum::<f64>() / factors.len() as f64;
    if mean.is_finite() {
        mean.clamp(MIN_CONFIDENCE, 1.0)
    } else {
        MIN_CONFIDENCE
    }
}

/// 1 when the mesh centroid sits at the image center, 0 a quarter-image away
fn center_factor(mesh: &LandmarkMesh, size: ImageSize) -> f64 {
    let Some(c) = riskmap_core::geometry::centroid(mesh.points()) else {
        return 0.0;
    };
    let (w, h) = (size.width_f(), size.height_f());
    let dx = ((c.x - w / 2.0).abs() / (w / 4.0)).min(1.0);
    let dy = ((c.y - h / 2.0).abs() / (h / 4.0)).min(1.0);
    (1.0 - dx) * (1.0 - dy)
}

/// Penalizes detections that are too small or too large for the frame
fn spread_factor(mesh: &LandmarkMesh, size: ImageSize) -> f64 {
    let points = mesh.points();
    let n = points.len() as f64;
    let (mean_x, mean_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x / n, sy + p.y / n));
    let (var_x, var_y) = points.iter().fold((0.0, 0.0), |(vx, vy), p| {
        (
            vx + (p.x - mean_x).powi(2) / n,
            vy + (p.y - mean_y).powi(2) / n,
        )
    });
    let spread = var_x.sqrt() + var_y.sqrt();
    let w = size.width_f();

    if spread > SPREAD_MAX_FRACTION * w {
        SPREAD_MAX_FRACTION * w / spread
    } else {
        (spread / (SPREAD_FULL_FRACTION * w)).min(1.0)
    }
}

/// Eye-to-mouth vertical distance should be a sensible share of the image
fn proportion_factor(mesh: &LandmarkMesh, size: ImageSize) -> f64 {
    let lookup = |name| landmark_index(name).and_then(|i| mesh.get(i));
    let (Some(left_eye), Some(right_eye), Some(mouth)) = (
        lookup("left_eye_inner"),
        lookup("right_eye_inner"),
        lookup("upper_lip_center"),
    ) else {
        return 0.5;
    };

    let h = size.height_f();
    let eye_y = (left_eye.y + right_eye.y) / 2.0;
    let distance = (mouth.y - eye_y).abs();
    if distance > 0.05 * h {
        (distance / (0.15 * h)).min(1.0)
    } else {
        0.3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::test_support::synthetic_mesh;

    #[test]
    fn test_normalize_synthetic_face() {
        let face = NormalizedFace::from_mesh(synthetic_mesh(), ImageSize::new(640, 480), 0.95)
            .unwrap();
        assert!(!face.alignment_applied);
        assert_eq!(face.detection_confidence, 0.95);
        assert!(face.confidence > 0.5 && face.confidence <= 1.0);
        assert_eq!(face.anchor("chin_tip"), Some(Point::new(320.0, 370.0)));
        assert!(face.face_bbox.width > 0.0 && face.face_bbox.height > 0.0);
    }

    #[test]
    fn test_sparse_mesh_scores_floor() {
        let mesh = LandmarkMesh::new(vec![Point::new(320.0, 240.0); 50]);
        assert_eq!(
            normalization_confidence(&mesh, ImageSize::new(640, 480)),
            MIN_CONFIDENCE
        );
    }

    #[test]
    fn test_off_center_tiny_face_is_clamped_not_zero() {
        // Every point stacked in a corner: zero spread, zero centering
        let mesh = LandmarkMesh::new(vec![Point::new(1.0, 1.0); 468]);
        let confidence = normalization_confidence(&mesh, ImageSize::new(640, 480));
        assert!(confidence >= MIN_CONFIDENCE);
        assert!(confidence < 0.5);
    }

    #[test]
    fn test_upside_down_face_keeps_proportion_score() {
        let size = ImageSize::new(640, 480);
        let upright = synthetic_mesh();
        let flipped = LandmarkMesh::new(
            upright
                .points()
                .iter()
                .map(|p| Point::new(p.x, 480.0 - p.y))
                .collect(),
        );
        assert_eq!(proportion_factor(&upright, size), 1.0);
        assert_eq!(proportion_factor(&flipped, size), 1.0);
    }

    #[test]
    fn test_oversized_spread_is_penalized() {
        let size = ImageSize::new(100, 100);
        let huge = LandmarkMesh::new(
            (0..468)
                .map(|i| {
                    if i % 2 == 0 {
                        Point::new(-500.0, -500.0)
                    } else {
                        Point::new(600.0, 600.0)
                    }
                })
                .collect(),
        );
        assert!(spread_factor(&huge, size) < 0.2);
    }

    #[test]
    fn test_rejects_unusable_input() {
        assert!(NormalizedFace::from_mesh(LandmarkMesh::default(), ImageSize::new(640, 480), 0.9)
            .is_err());
        assert!(NormalizedFace::from_mesh(synthetic_mesh(), ImageSize::new(0, 480), 0.9).is_err());
    }

    #[test]
    fn test_detection_confidence_is_clamped() {
        let face =
            NormalizedFace::from_mesh(synthetic_mesh(), ImageSize::new(640, 480), 3.0).unwrap();
        assert_eq!(face.detection_confidence, 1.0);
        let face = NormalizedFace::from_mesh(synthetic_mesh(), ImageSize::new(640, 480), f64::NAN)
            .unwrap();
        assert_eq!(face.detection_confidence, 0.0);
    }
}
