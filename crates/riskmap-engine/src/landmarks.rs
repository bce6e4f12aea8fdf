//! Landmark mesh and the named-anchor index table
//!
//! The index table is the only place that knows the detector's 468-point
//! face-mesh numbering. Everything downstream refers to anchors by name.

use riskmap_core::Point;
use riskmap_knowledge::KnowledgeStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of points in a complete face mesh
pub const MESH_SIZE: usize = 468;

/// Anchor name to mesh index
pub const LANDMARK_INDEX: &[(&str, usize)] = &[
    ("left_eye_inner", 133),
    ("left_eye_outer", 33),
    ("right_eye_inner", 362),
    ("right_eye_outer", 263),
    ("nose_tip", 1),
    ("nose_bridge_high", 6),
    ("left_alae", 31),
    ("right_alae", 261),
    ("upper_lip_center", 13),
    ("lower_lip_center", 14),
    ("lower_lip_bottom", 17),
    ("left_mouth_corner", 61),
    ("right_mouth_corner", 291),
    ("left_cupids_bow", 185),
    ("right_cupids_bow", 40),
    ("left_eyebrow_inner", 70),
    ("left_eyebrow_center", 107),
    ("left_eyebrow_peak", 105),
    ("right_eyebrow_inner", 300),
    ("right_eyebrow_center", 336),
    ("right_eyebrow_peak", 334),
    ("chin_tip", 175),
    ("left_jaw", 172),
    ("right_jaw", 397),
    ("left_temple", 162),
    ("right_temple", 389),
    ("forehead_center", 9),
];

/// Anchors computed as the midpoint of two indexed anchors
pub const DERIVED_LANDMARKS: &[(&str, &str, &str)] = &[
    ("left_eye_center", "left_eye_inner", "left_eye_outer"),
    ("right_eye_center", "right_eye_inner", "right_eye_outer"),
    (
        "eyebrow_center_midpoint",
        "left_eyebrow_center",
        "right_eyebrow_center",
    ),
];

pub fn landmark_index(name: &str) -> Option<usize> {
    LANDMARK_INDEX
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, i)| *i)
}

pub fn is_known_landmark(name: &str) -> bool {
    landmark_index(name).is_some() || DERIVED_LANDMARKS.iter().any(|(n, _, _)| *n == name)
}

/// Every anchor name the engine can resolve, indexed first then derived
pub fn known_landmark_names() -> impl Iterator<Item = &'static str> {
    LANDMARK_INDEX
        .iter()
        .map(|(n, _)| *n)
        .chain(DERIVED_LANDMARKS.iter().map(|(n, _, _)| *n))
}

/// Anchor names referenced by the store that the index table cannot resolve.
///
/// Such anchors would be skipped on every request; reporting them once at
/// startup surfaces authoring mistakes early.
pub fn audit_anchors(store: &KnowledgeStore) -> Vec<String> {
    let mut unknown = BTreeSet::new();
    for knowledge in store.areas() {
        for name in knowledge.anchor_names() {
            if !is_known_landmark(name) {
                unknown.insert(format!("{}: unknown anchor '{}'", knowledge.area, name));
            }
        }
    }
    unknown.into_iter().collect()
}

/// Ordered, index-addressable point mesh from the landmark provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkMesh(Vec<Point>);

impl LandmarkMesh {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        Self(pairs.iter().copied().map(Point::from_array).collect())
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.0.get(index).copied()
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fraction of the full mesh present, capped at 1
    pub fn completeness(&self) -> f64 {
        (self.0.len() as f64 / MESH_SIZE as f64).min(1.0)
    }
}

/// Semantic anchors extracted from a mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedLandmarks(BTreeMap<&'static str, Point>);

impl NamedLandmarks {
    /// Look up every indexed anchor present in the mesh, then derive midpoints
    pub fn from_mesh(mesh: &LandmarkMesh) -> Self {
        let mut named: BTreeMap<&'static str, Point> = LANDMARK_INDEX
            .iter()
            .filter_map(|(name, index)| mesh.get(*index).map(|p| (*name, p)))
            .collect();

        for (name, a, b) in DERIVED_LANDMARKS {
            if let (Some(pa), Some(pb)) = (named.get(a), named.get(b)) {
                let mid = pa.midpoint(pb);
                named.insert(*name, mid);
            }
        }

        Self(named)
    }

    pub fn get(&self, name: &str) -> Option<Point> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Point)> + '_ {
        self.0.iter().map(|(name, p)| (*name, *p))
    }
}

impl FromIterator<(&'static str, Point)> for NamedLandmarks {
    fn from_iter<I: IntoIterator<Item = (&'static str, Point)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A complete synthetic mesh: every point on a coarse grid centred in a
    /// 640x480 image, with the named anchors placed at plausible positions.
    pub fn synthetic_mesh() -> LandmarkMesh {
        let mut points: Vec<Point> = (0..MESH_SIZE)
            .map(|i| {
                let col = (i % 26) as f64;
                let row = (i / 26) as f64;
                Point::new(220.0 + col * 8.0, 130.0 + row * 12.0)
            })
            .collect();

        let anchors: &[(&str, (f64, f64))] = &[
            ("left_eye_inner", (295.0, 200.0)),
            ("left_eye_outer", (255.0, 200.0)),
            ("right_eye_inner", (345.0, 200.0)),
            ("right_eye_outer", (385.0, 200.0)),
            ("nose_tip", (320.0, 260.0)),
            ("nose_bridge_high", (320.0, 210.0)),
            ("left_alae", (300.0, 270.0)),
            ("right_alae", (340.0, 270.0)),
            ("upper_lip_center", (320.0, 300.0)),
            ("lower_lip_center", (320.0, 315.0)),
            ("lower_lip_bottom", (320.0, 330.0)),
            ("left_mouth_corner", (290.0, 308.0)),
            ("right_mouth_corner", (350.0, 308.0)),
            ("left_cupids_bow", (312.0, 296.0)),
            ("right_cupids_bow", (328.0, 296.0)),
            ("left_eyebrow_inner", (300.0, 180.0)),
            ("left_eyebrow_center", (275.0, 175.0)),
            ("left_eyebrow_peak", (265.0, 172.0)),
            ("right_eyebrow_inner", (340.0, 180.0)),
            ("right_eyebrow_center", (365.0, 175.0)),
            ("right_eyebrow_peak", (375.0, 172.0)),
            ("chin_tip", (320.0, 370.0)),
            ("left_jaw", (250.0, 340.0)),
            ("right_jaw", (390.0, 340.0)),
            ("left_temple", (235.0, 190.0)),
            ("right_temple", (405.0, 190.0)),
            ("forehead_center", (320.0, 140.0)),
        ];
        for (name, (x, y)) in anchors {
            if let Some(index) = landmark_index(name) {
                points[index] = Point::new(*x, *y);
            }
        }
        LandmarkMesh::new(points)
    }
}
