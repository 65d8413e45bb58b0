use crate::common::{GestureAuthError, Result};

/// Distance at which similarity reaches zero.
///
/// Calibrated empirically for the one/two-hand feature layouts. Changing it
/// shifts every score, so thresholds chosen for existing enrollments stop
/// meaning the same thing.
pub const DISTANCE_SCALE: f64 = 5.0;

/// Unweighted L2 distance over every component of both vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(GestureAuthError::IncompatibleVectors { left: a.len(), right: b.len() });
    }

    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(sum.sqrt())
}

/// Similarity in `[0, 100]`; 100 for identical vectors.
pub fn similarity_score(a: &[f64], b: &[f64]) -> Result<f64> {
    similarity_with_scale(a, b, DISTANCE_SCALE)
}

pub fn similarity_with_scale(a: &[f64], b: &[f64], distance_scale: f64) -> Result<f64> {
    let distance = euclidean_distance(a, b)?;
    Ok((100.0 * (1.0 - distance / distance_scale)).max(0.0))
}

/// Rejects match thresholds outside `[0, 100]`, NaN included.
pub fn check_threshold(threshold: f64) -> Result<()> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(())
    } else {
        Err(GestureAuthError::Config(format!(
            "Threshold must be between 0 and 100, got {}", threshold
        )))
    }
}

/// Scores possibly-missing vectors; an absent side scores 0.
pub fn score_optional(a: Option<&[f64]>, b: Option<&[f64]>, distance_scale: f64) -> Result<f64> {
    match (a, b) {
        (Some(a), Some(b)) => similarity_with_scale(a, b, distance_scale),
        _ => Ok(0.0),
    }
}
