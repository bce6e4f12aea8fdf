//! Safety validation of injection points and de-duplication of risk zones

use crate::results::{InjectionPointResult, RiskZoneResult};
use log::{debug, info, warn};
use riskmap_core::geometry::point_to_polygon_distance;
use riskmap_core::ImageSize;
use riskmap_knowledge::{Severity, TreatmentArea};

/// Bounding-box overlap (over the smaller box) above which a zone is redundant
pub const ZONE_OVERLAP_THRESHOLD: f64 = 0.5;

/// Per-area limits on point placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyPolicy {
    pub max_points: usize,
    pub min_point_distance_px: f64,
    pub boundary_buffer_px: f64,
}

impl SafetyPolicy {
    pub fn for_area(area: TreatmentArea) -> Self {
        let (max_points, min_point_distance_px, boundary_buffer_px) = match area {
            TreatmentArea::Lips => (8, 5.0, 3.0),
            TreatmentArea::Cheeks => (10, 8.0, 5.0),
            TreatmentArea::Chin => (6, 10.0, 5.0),
            TreatmentArea::Forehead => (8, 12.0, 8.0),
        };
        Self {
            max_points,
            min_point_distance_px,
            boundary_buffer_px,
        }
    }
}

/// Minimum distance an injection point must keep from a zone of this severity
pub fn clearance_px(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 20.0,
        Severity::High => 15.0,
        Severity::Moderate => 8.0,
        Severity::Low => 0.0,
    }
}

pub struct SafetyValidator {
    policy: SafetyPolicy,
    image_size: ImageSize,
}

impl SafetyValidator {
    pub fn new(policy: SafetyPolicy, image_size: ImageSize) -> Self {
        Self { policy, image_size }
    }

    pub fn for_area(area: TreatmentArea, image_size: ImageSize) -> Self {
        Self::new(SafetyPolicy::for_area(area), image_size)
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Filter candidates in order.
    ///
    /// Points inside a zone's clearance are kept but demoted; points too close
    /// to an already accepted point are rejected; the survivors are capped at
    /// `max_points` by confidence, ties keeping their original order.
    pub fn validate_points(
        &self,
        candidates: Vec<InjectionPointResult>,
        zones: &[RiskZoneResult],
    ) -> Vec<InjectionPointResult> {
        let total = candidates.len();
        let mut accepted: Vec<InjectionPointResult> = Vec::with_capacity(total);

        for mut point in candidates {
            let violations = zone_violations(&point, zones);
            if !violations.is_empty() {
                warn!("Point '{}' violates safety clearance: {:?}", point.label, violations);
                point.warnings.extend(violations);
                point.confidence *= 0.5;
            }

            if let Some(neighbour) = accepted.iter().find(|a| {
                a.position.distance(&point.position) < self.policy.min_point_distance_px
            }) {
                debug!(
                    "Point '{}' rejected: within {}px of '{}'",
                    point.label, self.policy.min_point_distance_px, neighbour.label
                );
                continue;
            }

            let edge_distance = self.image_size.distance_to_edge(&point.position);
            if edge_distance < self.policy.boundary_buffer_px {
                point.warnings.push(format!(
                    "Near image edge ({:.1}px < {}px buffer)",
                    edge_distance, self.policy.boundary_buffer_px
                ));
            }

            accepted.push(point);
        }

        if accepted.len() > self.policy.max_points {
            // sort_by is stable, so equal confidences keep input order
            accepted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            accepted.truncate(self.policy.max_points);
            info!("Limited to {} injection points", self.policy.max_points);
        }

        debug!("Validated {}/{} injection points", accepted.len(), total);
        accepted
    }
}

fn zone_violations(point: &InjectionPointResult, zones: &[RiskZoneResult]) -> Vec<String> {
    zones
        .iter()
        .filter_map(|zone| {
            let required = clearance_px(zone.severity);
            let distance = point_to_polygon_distance(point.position, &zone.polygon);
            (distance < required).then(|| {
                format!(
                    "Too close to {} ({:.1}px < {}px required)",
                    zone.name, distance, required
                )
            })
        })
        .collect()
}

/// Drop zones whose bounding box mostly overlaps a more severe kept zone.
///
/// Zones are visited from most to least severe (input order within a
/// severity). The overlap is measured on axis-aligned bounding boxes, not on
/// the polygons themselves, so irregular shapes can be over- or under-merged.
pub fn dedup_zones(mut zones: Vec<RiskZoneResult>) -> Vec<RiskZoneResult> {
    if zones.len() <= 1 {
        return zones;
    }
    zones.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut kept: Vec<RiskZoneResult> = Vec::with_capacity(zones.len());
    for zone in zones {
        let bbox = zone.bbox();
        let redundant = kept.iter().any(|existing| {
            let other = existing.bbox();
            let smaller = bbox.area().min(other.area());
            smaller > 0.0 && bbox.intersection_area(&other) / smaller > ZONE_OVERLAP_THRESHOLD
        });

        if redundant {
            debug!("Dropping overlapping zone '{}'", zone.name);
        } else {
            kept.push(zone);
        }
    }
    kept
}
