//! # Speed Estimation
//!
//! Trip speed estimates that hold up under GPS error.
//!
//! Both estimators work on consecutive point pairs ("segments") and weight
//! each segment by its length. A plain mean over segments over-weights the
//! dense clusters of near-zero samples a phone records while waiting at a
//! light; weighting by distance makes the result match distance over time
//! spent moving.
//!
//! - [`weighted_average_speed`] rejects implausible segments (too fast,
//!   impossible acceleration, or so short that position error dominates).
//! - [`percentile_speed_range`] trims the slowest and fastest segments
//!   symmetrically and reports the range and weighted mean of the rest.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::features::speed_kmh;
use crate::geo_utils::haversine_distance;
use crate::TripPoint;

/// Configuration for speed estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Segments faster than this are rejected (km/h)
    pub max_speed_kmh: f64,
    /// Maximum acceleration between consecutive segments (m/s²)
    pub max_acceleration: f64,
    /// Maximum deceleration between consecutive segments, positive (m/s²)
    pub max_deceleration: f64,
    /// Segments shorter than this are checked against GPS uncertainty (meters)
    pub uncertain_segment_length: f64,
    /// Minimum time gap for a segment to enter the percentile range (seconds)
    pub min_time_gap: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: 1500.0,
            max_acceleration: 15.0,
            max_deceleration: 15.0,
            uncertain_segment_length: 50.0,
            min_time_gap: 1.0,
        }
    }
}

/// Trimmed speed statistics for a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    /// Lower percentile bound (km/h)
    pub min_speed: Option<f64>,
    /// Upper percentile bound (km/h)
    pub max_speed: Option<f64>,
    /// Distance-weighted mean of the retained segments (km/h)
    pub avg_speed_weighted: Option<f64>,
    /// Segments with a usable speed
    pub total_points: usize,
    /// Segments inside the percentile bounds
    pub included_points: usize,
}

/// One consecutive pair of points.
#[derive(Debug, Clone, Copy)]
struct Segment {
    distance: f64,
    time_diff: f64,
    /// Sum of both endpoints' accuracies (meters)
    uncertainty: f64,
}

impl Segment {
    fn speed_kmh(&self) -> f64 {
        speed_kmh(self.distance, self.time_diff)
    }
}

fn segments(points: &[TripPoint], filter_to_valid: bool) -> Vec<Segment> {
    let selected: Vec<&TripPoint> = points
        .iter()
        .filter(|p| !filter_to_valid || p.is_valid)
        .collect();

    selected
        .windows(2)
        .map(|w| Segment {
            distance: haversine_distance(&w[0].position(), &w[1].position()),
            time_diff: w[1].seconds_since(w[0]),
            uncertainty: w[0].accuracy + w[1].accuracy,
        })
        .collect()
}

/// Distance-weighted average speed in km/h.
///
/// Returns `None` when no accepted segment covers any distance.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{TripPoint, SpeedConfig, weighted_average_speed};
///
/// // A single pair that did not move
/// let points = vec![
///     TripPoint::new(0, 48.8566, 2.3522),
///     TripPoint::new(30_000, 48.8566, 2.3522),
/// ];
/// assert_eq!(weighted_average_speed(&points, true, &SpeedConfig::default()), None);
/// ```
pub fn weighted_average_speed(points: &[TripPoint], filter_to_valid: bool, config: &SpeedConfig) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_distance = 0.0;
    let mut rejected = 0;

    // Speed of the previous segment in m/s, the reference for acceleration
    let mut prev_speed: Option<f64> = None;

    for segment in segments(points, filter_to_valid) {
        if segment.time_diff <= 0.0 {
            prev_speed = None;
            rejected += 1;
            continue;
        }

        let speed_ms = segment.distance / segment.time_diff;
        let acceleration = prev_speed.map(|prev| (speed_ms - prev) / segment.time_diff);
        prev_speed = Some(speed_ms);

        let too_fast = segment.speed_kmh() > config.max_speed_kmh;
        let impossible_acceleration = acceleration.is_some_and(|a| {
            a > config.max_acceleration || a < -config.max_deceleration
        });
        let uncertain = segment.uncertainty > 2.0 * segment.distance
            && segment.distance < config.uncertain_segment_length;

        if too_fast || impossible_acceleration || uncertain {
            rejected += 1;
            continue;
        }

        weighted_sum += segment.speed_kmh() * segment.distance;
        total_distance += segment.distance;
    }

    debug!(
        "[SpeedEstimator] Weighted average over {:.0}m ({} segments rejected)",
        total_distance, rejected
    );

    if total_distance > 0.0 {
        Some(weighted_sum / total_distance)
    } else {
        None
    }
}

/// Speed range after trimming the slowest and fastest segments.
///
/// Keeps the central `percentage` percent of segment speeds: with 90, the
/// bounds are the 5th and 95th percentiles (linearly interpolated). Only
/// segments with a time gap of at least `config.min_time_gap` and a positive
/// distance count.
///
/// # Errors
///
/// [`AnalysisError::Validation`] when `percentage` is not in `(0, 100]`.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{TripPoint, SpeedConfig, percentile_speed_range};
///
/// let points: Vec<TripPoint> = (0..=10)
///     .map(|i| TripPoint::new(i * 10_000, 48.8566 + i as f64 * 0.0009, 2.3522))
///     .collect();
///
/// let range = percentile_speed_range(&points, true, 90.0, &SpeedConfig::default()).unwrap();
/// assert_eq!(range.total_points, 10);
/// assert!(percentile_speed_range(&points, true, 0.0, &SpeedConfig::default()).is_err());
/// ```
pub fn percentile_speed_range(
    points: &[TripPoint],
    filter_to_valid: bool,
    percentage: f64,
    config: &SpeedConfig,
) -> Result<SpeedRange> {
    if !(percentage > 0.0 && percentage <= 100.0) {
        return Err(AnalysisError::Validation(format!(
            "percentage to include must be in (0, 100], got {}",
            percentage
        )));
    }

    let usable: Vec<(f64, f64)> = segments(points, filter_to_valid)
        .into_iter()
        .filter(|s| s.time_diff >= config.min_time_gap && s.distance > 0.0)
        .map(|s| (s.speed_kmh(), s.distance))
        .collect();

    if usable.is_empty() {
        return Ok(SpeedRange::default());
    }

    let mut speeds: Vec<f64> = usable.iter().map(|(speed, _)| *speed).collect();
    speeds.sort_by(|a, b| a.total_cmp(b));

    let lower_pct = (100.0 - percentage) / 2.0;
    let upper_pct = 100.0 - lower_pct;
    let min_speed = percentile(&speeds, lower_pct / 100.0);
    let max_speed = percentile(&speeds, upper_pct / 100.0);

    let retained: Vec<&(f64, f64)> = usable
        .iter()
        .filter(|(speed, _)| *speed >= min_speed && *speed <= max_speed)
        .collect();

    let retained_distance: f64 = retained.iter().map(|(_, d)| d).sum();
    let avg_speed_weighted = if retained_distance > 0.0 {
        Some(retained.iter().map(|(s, d)| s * d).sum::<f64>() / retained_distance)
    } else {
        None
    };

    Ok(SpeedRange {
        min_speed: Some(min_speed),
        max_speed: Some(max_speed),
        avg_speed_weighted,
        total_points: usable.len(),
        included_points: retained.len(),
    })
}

/// Continuous percentile of sorted values, `fraction` in `[0, 1]`.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
