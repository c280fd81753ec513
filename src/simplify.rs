//! # Trajectory Simplification
//!
//! Reduces a trip to the vertices needed to draw it within a tolerance given
//! in meters, keeping every surviving vertex a real recorded point.
//!
//! ## Algorithm
//! 1. Sort by timestamp and drop points with non-finite or out-of-range coordinates
//! 2. Project into a local metric frame so the tolerance means the same everywhere
//! 3. Fast mode only: radial-distance pre-filter (drop points within the
//!    tolerance of the last kept point)
//! 4. Douglas-Peucker simplification
//! 5. Map every surviving vertex back to the recorded point it came from by
//!    index, so timestamp, accuracy and heading travel with it
//!
//! Simplification never blocks a caller: [`simplify_trajectory`] returns the
//! input unchanged if anything goes wrong.

use geo::{Coord, LineString, SimplifyIdx};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geo_utils::LocalProjection;
use crate::{positions, TripPoint};

/// Configuration for trajectory simplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Maximum distance between the simplified and original path (meters)
    pub tolerance_meters: f64,
    /// Run exact Douglas-Peucker only; when false a radial-distance pass
    /// thins the input first, which is faster on dense traces
    pub high_quality: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            tolerance_meters: 10.0,
            high_quality: false,
        }
    }
}

// =============================================================================
// Simplification
// =============================================================================

/// Simplify a trip, falling back to the untouched input on failure.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{TripPoint, simplify_trajectory};
///
/// // A straight line collapses to its endpoints
/// let points: Vec<TripPoint> = (0..20)
///     .map(|i| TripPoint::new(i * 5_000, 48.8566 + i as f64 * 0.0001, 2.3522))
///     .collect();
///
/// let simplified = simplify_trajectory(&points, 10.0, true);
/// assert_eq!(simplified.len(), 2);
/// assert_eq!(simplified[0], points[0]);
/// assert_eq!(simplified[1], points[19]);
/// ```
pub fn simplify_trajectory(points: &[TripPoint], tolerance_meters: f64, high_quality: bool) -> Vec<TripPoint> {
    match try_simplify_trajectory(points, tolerance_meters, high_quality) {
        Ok(simplified) => simplified,
        Err(e) => {
            warn!(
                "[TrajectorySimplifier] Keeping {} original points: {}",
                points.len(),
                e
            );
            points.to_vec()
        }
    }
}

/// Simplify a trip, reporting internal failures instead of recovering.
///
/// Inputs of 0, 1 or 2 points, or with fewer than 3 usable coordinates, are
/// returned unchanged.
pub fn try_simplify_trajectory(
    points: &[TripPoint],
    tolerance_meters: f64,
    high_quality: bool,
) -> Result<Vec<TripPoint>> {
    if points.len() <= 2 {
        return Ok(points.to_vec());
    }
    if !(tolerance_meters.is_finite() && tolerance_meters >= 0.0) {
        return Err(AnalysisError::Computation(format!(
            "tolerance must be a finite, non-negative distance, got {}",
            tolerance_meters
        )));
    }

    let mut valid: Vec<TripPoint> = points
        .iter()
        .filter(|p| p.position().is_valid())
        .cloned()
        .collect();
    if valid.len() < 3 {
        return Ok(points.to_vec());
    }
    valid.sort_by_key(|p| p.timestamp);

    let projection = LocalProjection::for_points(&positions(&valid));
    let coords: Vec<Coord<f64>> = valid.iter().map(|p| projection.project(&p.position())).collect();
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(AnalysisError::Computation(
            "projection produced non-finite coordinates".to_string(),
        ));
    }

    let kept: Vec<usize> = if high_quality {
        (0..coords.len()).collect()
    } else {
        radial_filter(&coords, tolerance_meters)
    };
    let candidates: Vec<Coord<f64>> = kept.iter().map(|&i| coords[i]).collect();
    let vertices = LineString::new(candidates).simplify_idx(&tolerance_meters);
    if vertices.len() < 2 {
        return Err(AnalysisError::Computation(format!(
            "simplification left {} vertices",
            vertices.len()
        )));
    }

    Ok(vertices.into_iter().map(|v| valid[kept[v]].clone()).collect())
}

/// Indices of the points left after dropping those closer than `tolerance` to
/// the last kept point. The first and last indices are always kept.
fn radial_filter(coords: &[Coord<f64>], tolerance: f64) -> Vec<usize> {
    let tolerance_sq = tolerance * tolerance;
    let last_idx = coords.len() - 1;
    let mut kept = vec![0];
    let mut last = coords[0];

    for (idx, &coord) in coords.iter().enumerate().take(last_idx).skip(1) {
        let dx = coord.x - last.x;
        let dy = coord.y - last.y;
        if dx * dx + dy * dy > tolerance_sq {
            kept.push(idx);
            last = coord;
        }
    }

    kept.push(last_idx);
    kept
}
