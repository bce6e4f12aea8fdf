//! Rule interpreter: one function per rule kind
//!
//! Each function maps a rule's typed parameters plus the normalized face to
//! pixel geometry. Anchors that fail to resolve are recorded and skipped; a
//! rule only yields nothing when too few anchors remain for its shape.

use crate::normalizer::NormalizedFace;
use riskmap_core::geometry::{
    buffer_polyline, circle_polygon, centroid, densify_polyline, ellipse_polygon,
    expand_from_centroid, weighted_centroid, CURVE_SAMPLES_PER_SEGMENT,
};
use riskmap_core::Point;
use riskmap_knowledge::{
    BoneDirection, BonePointParams, CircleParams, EllipseParams, LineShape, MaskParams,
    PolygonParams, PolylineBufferParams, RuleKind, VectorOffsetParams,
};

/// Fraction of the way a bone point moves toward the face center
const BONE_INWARD_FRACTION: f64 = 0.1;

/// Geometry produced by one rule
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    /// One or more closed polygons, each with at least three vertices
    Polygons(Vec<Vec<Point>>),
}

/// Result of interpreting a single rule
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub geometry: Option<Geometry>,
    /// Anchor names that could not be resolved on this face
    pub unresolved: Vec<String>,
}

impl Interpretation {
    pub fn point(&self) -> Option<Point> {
        match &self.geometry {
            Some(Geometry::Point(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn polygons(&self) -> &[Vec<Point>] {
        match &self.geometry {
            Some(Geometry::Polygons(polys)) => polys,
            _ => &[],
        }
    }
}

/// Evaluates rule documents against one normalized face
pub struct RuleInterpreter<'a> {
    face: &'a NormalizedFace,
}

impl<'a> RuleInterpreter<'a> {
    pub fn new(face: &'a NormalizedFace) -> Self {
        Self { face }
    }

    pub fn interpret(&self, rule: &RuleKind) -> Interpretation {
        let mut resolver = AnchorResolver::new(self.face);

        let geometry = match rule {
            RuleKind::LandmarkVectorOffset(p) => self.vector_offset(p, &mut resolver).map(Geometry::Point),
            RuleKind::BonePoint(p) => self.bone_point(p, &mut resolver).map(Geometry::Point),
            RuleKind::PolylineBufferFromLandmarks(p) => polygons(self.polyline_buffer(p, &mut resolver)),
            RuleKind::CircleAroundLandmark(p) => polygons(self.circles(p, &mut resolver)),
            RuleKind::EllipseAroundLandmarks(p) => polygons(self.ellipse(p, &mut resolver)),
            RuleKind::PolygonFromLandmarks(p) => polygons(self.polygon(p, &mut resolver)),
            RuleKind::MaskFromLandmarkLoop(p) => polygons(self.mask(p, &mut resolver)),
        };

        Interpretation {
            geometry,
            unresolved: resolver.missing,
        }
    }

    fn bbox_offset(&self, x_fraction: f64, y_fraction: f64) -> Point {
        Point::new(
            x_fraction * self.face.face_bbox.width,
            y_fraction * self.face.face_bbox.height,
        )
    }

    fn vector_offset(&self, params: &VectorOffsetParams, resolver: &mut AnchorResolver) -> Option<Point> {
        let weighted: Vec<(Point, f64)> = resolver
            .resolve_indexed(&params.anchors)
            .into_iter()
            .map(|(i, p)| (p, params.weight(i)))
            .collect();

        let base = weighted_centroid(&weighted)?;
        let offset = params.offset_percent;
        let position = base + self.bbox_offset(offset.x, offset.y);
        finite_point(self.face.image_size.clamp(position))
    }

    fn bone_point(&self, params: &BonePointParams, resolver: &mut AnchorResolver) -> Option<Point> {
        let first = params.anchors.first()?;
        let anchor = resolver.resolve_one(first)?;
        let position = match params.bone_direction {
            BoneDirection::Inward => {
                let center = self.face.face_bbox.center();
                anchor + (center - anchor) * BONE_INWARD_FRACTION
            }
            BoneDirection::Surface => anchor,
        };
        finite_point(self.face.image_size.clamp(position))
    }

    fn polyline_buffer(&self, params: &PolylineBufferParams, resolver: &mut AnchorResolver) -> Vec<Vec<Point>> {
        let line = resolver.resolve(&params.anchors);
        if line.len() < 2 {
            return Vec::new();
        }
        let line = match params.shape {
            LineShape::CurvedPolyline => densify_polyline(&line, CURVE_SAMPLES_PER_SEGMENT),
            LineShape::StraightLine => line,
        };
        vec![buffer_polyline(&line, params.buffer_px)]
    }

    fn circles(&self, params: &CircleParams, resolver: &mut AnchorResolver) -> Vec<Vec<Point>> {
        let offset = params.offset_percent;
        let mut result = Vec::new();

        for name in &params.anchors {
            if let Some(anchor) = resolver.resolve_one(name) {
                let center = anchor + self.bbox_offset(offset.x, offset.y);
                result.push(circle_polygon(center, params.radius_px));
            }

            if !params.bilateral {
                continue;
            }
            let Some(mirror) = mirrored_name(name) else {
                continue;
            };
            if params.anchors.iter().any(|a| *a == mirror) {
                continue;
            }
            if let Some(anchor) = resolver.resolve_one(&mirror) {
                let center = anchor + self.bbox_offset(offset.mirrored_x(), offset.y);
                result.push(circle_polygon(center, params.radius_px));
            }
        }

        result
    }

    fn ellipse(&self, params: &EllipseParams, resolver: &mut AnchorResolver) -> Vec<Vec<Point>> {
        let resolved = resolver.resolve(&params.anchors);
        match centroid(&resolved) {
            Some(center) => vec![ellipse_polygon(center, params.width, params.height)],
            None => Vec::new(),
        }
    }

    fn polygon(&self, params: &PolygonParams, resolver: &mut AnchorResolver) -> Vec<Vec<Point>> {
        let vertices = resolver.resolve(&params.anchors);
        if vertices.len() < 3 {
            return Vec::new();
        }
        if params.buffer_px > 0.0 {
            vec![expand_from_centroid(&vertices, params.buffer_px)]
        } else {
            vec![vertices]
        }
    }

    fn mask(&self, params: &MaskParams, resolver: &mut AnchorResolver) -> Vec<Vec<Point>> {
        let vertices = resolver.resolve(&params.anchors);
        if vertices.len() < 3 {
            return Vec::new();
        }
        vec![vertices]
    }
}

/// Keep only well-formed polygons; `None` when nothing survives
fn polygons(candidates: Vec<Vec<Point>>) -> Option<Geometry> {
    let kept: Vec<Vec<Point>> = candidates
        .into_iter()
        .filter(|poly| poly.len() >= 3 && poly.iter().all(Point::is_finite))
        .collect();
    (!kept.is_empty()).then_some(Geometry::Polygons(kept))
}

fn finite_point(p: Point) -> Option<Point> {
    p.is_finite().then_some(p)
}

/// The bilateral counterpart of an anchor name (`left_*` <-> `right_*`)
pub fn mirrored_name(name: &str) -> Option<String> {
    if name.contains("left") {
        Some(name.replace("left", "right"))
    } else if name.contains("right") {
        Some(name.replace("right", "left"))
    } else {
        None
    }
}

struct AnchorResolver<'a> {
    face: &'a NormalizedFace,
    missing: Vec<String>,
}

impl<'a> AnchorResolver<'a> {
    fn new(face: &'a NormalizedFace) -> Self {
        Self {
            face,
            missing: Vec::new(),
        }
    }

    fn resolve_one(&mut self, name: &str) -> Option<Point> {
        let found = self.face.anchor(name);
        if found.is_none() && !self.missing.iter().any(|m| m == name) {
            self.missing.push(name.to_string());
        }
        found
    }

    /// Resolved anchors in document order
    fn resolve(&mut self, names: &[String]) -> Vec<Point> {
        names.iter().filter_map(|n| self.resolve_one(n)).collect()
    }

    /// Resolved anchors paired with their position in the document
    fn resolve_indexed(&mut self, names: &[String]) -> Vec<(usize, Point)> {
        names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| self.resolve_one(n).map(|p| (i, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LandmarkMesh, NamedLandmarks};
    use riskmap_core::{BoundingBox, ImageSize};
    use riskmap_knowledge::OffsetPercent;

    /// A face with hand-placed anchors and a fixed bounding box
    fn face_with(anchors: &[(&'static str, (f64, f64))], bbox: BoundingBox) -> NormalizedFace {
        let named: NamedLandmarks = anchors
            .iter()
            .map(|(name, (x, y))| (*name, Point::new(*x, *y)))
            .collect();
        NormalizedFace {
            landmarks: LandmarkMesh::new(named.iter().map(|(_, p)| p).collect()),
            named,
            face_bbox: bbox,
            confidence: 0.9,
            detection_confidence: 0.9,
            alignment_applied: false,
            image_size: ImageSize::new(640, 480),
        }
    }

    fn anchors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn mouth_face() -> NormalizedFace {
        face_with(
            &[
                ("left_mouth_corner", (120.0, 180.0)),
                ("right_mouth_corner", (280.0, 180.0)),
                ("upper_lip_center", (200.0, 170.0)),
            ],
            BoundingBox::new(100.0, 100.0, 200.0, 200.0),
        )
    }

    #[test]
    fn test_vector_offset_example() {
        let face = mouth_face();
        let rule = RuleKind::LandmarkVectorOffset(VectorOffsetParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner"]),
            anchor_weights: Some(vec![1.0, 1.0]),
            offset_percent: OffsetPercent {
                x: 0.0,
                y: 0.1,
                x_mirrored: None,
            },
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        assert_eq!(result.point(), Some(Point::new(200.0, 200.0)));
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_vector_offset_zero_weights_is_none() {
        let face = mouth_face();
        let rule = RuleKind::LandmarkVectorOffset(VectorOffsetParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner"]),
            anchor_weights: Some(vec![0.0, 0.0]),
            offset_percent: OffsetPercent::default(),
        });
        assert_eq!(RuleInterpreter::new(&face).interpret(&rule).geometry, None);
    }

    #[test]
    fn test_vector_offset_skips_missing_anchor_weights_follow_index() {
        let face = mouth_face();
        let rule = RuleKind::LandmarkVectorOffset(VectorOffsetParams {
            anchors: anchors(&["chin_tip", "left_mouth_corner", "right_mouth_corner"]),
            anchor_weights: Some(vec![5.0, 3.0, 1.0]),
            offset_percent: OffsetPercent::default(),
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        // (120*3 + 280*1) / 4 = 160
        assert_eq!(result.point(), Some(Point::new(160.0, 180.0)));
        assert_eq!(result.unresolved, vec!["chin_tip".to_string()]);
    }

    #[test]
    fn test_vector_offset_clamped_to_image() {
        let face = mouth_face();
        let rule = RuleKind::LandmarkVectorOffset(VectorOffsetParams {
            anchors: anchors(&["upper_lip_center"]),
            anchor_weights: None,
            offset_percent: OffsetPercent {
                x: 5.0,
                y: -5.0,
                x_mirrored: None,
            },
        });
        let p = RuleInterpreter::new(&face).interpret(&rule).point().unwrap();
        assert_eq!(p, Point::new(639.0, 0.0));
    }

    #[test]
    fn test_circle_vertices_at_radius() {
        let face = face_with(
            &[("nose_tip", (50.0, 50.0))],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let rule = RuleKind::CircleAroundLandmark(CircleParams {
            anchors: anchors(&["nose_tip"]),
            radius_px: 10.0,
            offset_percent: OffsetPercent::default(),
            bilateral: false,
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        let polys = result.polygons();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 16);
        for v in &polys[0] {
            assert!((v.distance(&Point::new(50.0, 50.0)) - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bilateral_circle_mirrors_with_independent_offset() {
        let face = face_with(
            &[("left_alae", (100.0, 100.0)), ("right_alae", (200.0, 100.0))],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let rule = RuleKind::CircleAroundLandmark(CircleParams {
            anchors: anchors(&["left_alae"]),
            radius_px: 5.0,
            offset_percent: OffsetPercent {
                x: -0.1,
                y: 0.0,
                x_mirrored: Some(0.2),
            },
            bilateral: true,
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        let polys = result.polygons();
        assert_eq!(polys.len(), 2);
        let left = centroid(&polys[0]).unwrap();
        let right = centroid(&polys[1]).unwrap();
        assert!((left.x - 90.0).abs() < 1e-9);
        assert!((right.x - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_mirrored_offset_applies_to_left_when_right_is_authored() {
        let face = face_with(
            &[("left_alae", (100.0, 100.0)), ("right_alae", (200.0, 100.0))],
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        );
        let rule = RuleKind::CircleAroundLandmark(CircleParams {
            anchors: anchors(&["right_alae"]),
            radius_px: 5.0,
            offset_percent: OffsetPercent {
                x: 0.1,
                y: 0.0,
                x_mirrored: Some(-0.3),
            },
            bilateral: true,
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        let polys = result.polygons();
        assert_eq!(polys.len(), 2);
        let authored = centroid(&polys[0]).unwrap();
        let mirrored = centroid(&polys[1]).unwrap();
        assert!((authored.x - 210.0).abs() < 1e-9);
        assert!((mirrored.x - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_buffer_needs_two_anchors() {
        let face = mouth_face();
        let rule = RuleKind::PolylineBufferFromLandmarks(PolylineBufferParams {
            anchors: anchors(&["left_mouth_corner", "chin_tip"]),
            buffer_px: 5.0,
            shape: LineShape::StraightLine,
        });
        let result = RuleInterpreter::new(&face).interpret(&rule);
        assert_eq!(result.geometry, None);
        assert_eq!(result.unresolved, vec!["chin_tip".to_string()]);
    }

    #[test]
    fn test_polyline_buffer_ribbon() {
        let face = mouth_face();
        let straight = RuleKind::PolylineBufferFromLandmarks(PolylineBufferParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner"]),
            buffer_px: 5.0,
            shape: LineShape::StraightLine,
        });
        let result = RuleInterpreter::new(&face).interpret(&straight);
        let ribbon = &result.polygons()[0];
        assert_eq!(ribbon.len(), 4);
        for v in ribbon {
            assert!(((v.y - 180.0).abs() - 5.0).abs() < 1e-9);
        }

        let curved = RuleKind::PolylineBufferFromLandmarks(PolylineBufferParams {
            anchors: anchors(&["left_mouth_corner", "upper_lip_center", "right_mouth_corner"]),
            buffer_px: 5.0,
            shape: LineShape::CurvedPolyline,
        });
        let result = RuleInterpreter::new(&face).interpret(&curved);
        assert_eq!(result.polygons()[0].len(), 2 * (2 * CURVE_SAMPLES_PER_SEGMENT + 1));
    }

    #[test]
    fn test_ellipse_and_polygon() {
        let face = mouth_face();
        let ellipse = RuleKind::EllipseAroundLandmarks(EllipseParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner"]),
            width: 40.0,
            height: 20.0,
        });
        let result = RuleInterpreter::new(&face).interpret(&ellipse);
        let poly = &result.polygons()[0];
        assert_eq!(poly.len(), 16);
        assert!((poly[0].x - 220.0).abs() < 1e-9);

        let polygon = RuleKind::PolygonFromLandmarks(PolygonParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner", "upper_lip_center"]),
            buffer_px: 0.0,
        });
        let result = RuleInterpreter::new(&face).interpret(&polygon);
        assert_eq!(result.polygons()[0][0], Point::new(120.0, 180.0));

        let buffered = RuleKind::PolygonFromLandmarks(PolygonParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner", "upper_lip_center"]),
            buffer_px: 4.0,
        });
        let result = RuleInterpreter::new(&face).interpret(&buffered);
        assert!(result.polygons()[0][0].x < 120.0);
    }

    #[test]
    fn test_mask_needs_three_anchors() {
        let face = mouth_face();
        let rule = RuleKind::MaskFromLandmarkLoop(MaskParams {
            anchors: anchors(&["left_mouth_corner", "right_mouth_corner", "nose_tip"]),
        });
        assert_eq!(RuleInterpreter::new(&face).interpret(&rule).geometry, None);
    }

    #[test]
    fn test_bone_point_inward() {
        let face = face_with(
            &[("chin_tip", (200.0, 300.0))],
            BoundingBox::new(100.0, 100.0, 200.0, 200.0),
        );
        let inward = RuleKind::BonePoint(BonePointParams {
            anchors: anchors(&["chin_tip"]),
            bone_direction: BoneDirection::Inward,
        });
        let p = RuleInterpreter::new(&face).interpret(&inward).point().unwrap();
        assert!((p.y - 290.0).abs() < 1e-9);

        let surface = RuleKind::BonePoint(BonePointParams {
            anchors: anchors(&["chin_tip"]),
            bone_direction: BoneDirection::Surface,
        });
        let p = RuleInterpreter::new(&face).interpret(&surface).point().unwrap();
        assert_eq!(p, Point::new(200.0, 300.0));
    }

    #[test]
    fn test_mirrored_name() {
        assert_eq!(mirrored_name("left_alae").as_deref(), Some("right_alae"));
        assert_eq!(mirrored_name("right_jaw").as_deref(), Some("left_jaw"));
        assert_eq!(mirrored_name("chin_tip"), None);
    }
}
