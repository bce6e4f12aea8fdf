//! Informational facial measurements and proportion checks

use crate::landmarks::NamedLandmarks;
use serde::{Deserialize, Serialize};

/// Pixel distances between key anchors; absent when an anchor is missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacialMeasurements {
    pub inter_pupillary_distance: Option<f64>,
    pub eye_to_mouth: Option<f64>,
    pub mouth_width: Option<f64>,
    /// Distance between the outer eye corners
    pub face_width: Option<f64>,
    pub nose_width: Option<f64>,
    pub proportions: Vec<ProportionCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionCheck {
    pub name: String,
    pub ratio: f64,
    pub expected_min: f64,
    pub expected_max: f64,
    pub within_range: bool,
}

impl FacialMeasurements {
    pub fn from_landmarks(named: &NamedLandmarks) -> Self {
        let distance = |a: &str, b: &str| {
            let (pa, pb) = (named.get(a)?, named.get(b)?);
            Some(pa.distance(&pb))
        };

        let mut m = Self {
            inter_pupillary_distance: distance("left_eye_center", "right_eye_center"),
            eye_to_mouth: distance("left_eye_center", "upper_lip_center"),
            mouth_width: distance("left_mouth_corner", "right_mouth_corner"),
            face_width: distance("left_eye_outer", "right_eye_outer"),
            nose_width: distance("left_alae", "right_alae"),
            proportions: Vec::new(),
        };

        let checks = [
            ("mouth_nose_ratio", m.mouth_width, m.nose_width, 1.4, 1.8),
            ("ipd_face_ratio", m.inter_pupillary_distance, m.face_width, 0.25, 0.35),
            ("eye_mouth_ipd_ratio", m.eye_to_mouth, m.inter_pupillary_distance, 0.8, 1.2),
        ];
        for (name, numerator, denominator, min, max) in checks {
            if let (Some(n), Some(d)) = (numerator, denominator) {
                if d > 0.0 {
                    let ratio = n / d;
                    m.proportions.push(ProportionCheck {
                        name: name.to_string(),
                        ratio,
                        expected_min: min,
                        expected_max: max,
                        within_range: (min..=max).contains(&ratio),
                    });
                }
            }
        }

        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskmap_core::Point;

    #[test]
    fn test_measurements_and_ratios() {
        let named: NamedLandmarks = [
            ("left_eye_center", Point::new(100.0, 100.0)),
            ("right_eye_center", Point::new(160.0, 100.0)),
            ("upper_lip_center", Point::new(100.0, 160.0)),
            ("left_mouth_corner", Point::new(105.0, 165.0)),
            ("right_mouth_corner", Point::new(155.0, 165.0)),
            ("left_alae", Point::new(115.0, 140.0)),
            ("right_alae", Point::new(145.0, 140.0)),
        ]
        .into_iter()
        .collect();

        let m = FacialMeasurements::from_landmarks(&named);
        assert_eq!(m.inter_pupillary_distance, Some(60.0));
        assert_eq!(m.eye_to_mouth, Some(60.0));
        assert_eq!(m.face_width, None);

        let names: Vec<_> = m.proportions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mouth_nose_ratio", "eye_mouth_ipd_ratio"]);
        // 50 / 30
        assert!(m.proportions[0].within_range);
        assert!((m.proportions[1].ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_landmarks() {
        let m = FacialMeasurements::from_landmarks(&NamedLandmarks::default());
        assert_eq!(m, FacialMeasurements::default());
    }
}
