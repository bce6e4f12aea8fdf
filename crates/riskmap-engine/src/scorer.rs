//! Overall confidence scoring

const DETECTION_WEIGHT: f64 = 0.5;
const NORMALIZATION_WEIGHT: f64 = 0.3;
const COMPLETENESS_WEIGHT: f64 = 0.2;

/// Number of emitted results at which the completeness term saturates
const EXPECTED_RESULTS: f64 = 8.0;

pub const MIN_SCORE: f64 = 0.1;

/// Weighted blend of detector, normalizer and output completeness, in `[0.1, 1.0]`
pub fn confidence_score(
    detection_confidence: f64,
    normalization_confidence: f64,
    point_count: usize,
    zone_count: usize,
) -> f64 {
    let completeness = ((point_count + zone_count) as f64 / EXPECTED_RESULTS).min(1.0);
    let score = DETECTION_WEIGHT * detection_confidence
        + NORMALIZATION_WEIGHT * normalization_confidence
        + COMPLETENESS_WEIGHT * completeness;

    if score.is_finite() {
        score.clamp(MIN_SCORE, 1.0)
    } else {
        MIN_SCORE
    }
}
