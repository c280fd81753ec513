//! One-way invalidation of physically impossible points.
//!
//! Walks the still-valid points of a trip in timestamp order and flags the
//! ones whose implied speed or acceleration cannot be real, or whose fix is
//! unreliable. Each point is measured against the previous point that
//! survived, so a rejected spike never becomes the reference for its
//! neighbours. Running the pass again over its own output therefore finds
//! nothing new.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::{elapsed_seconds, GpsPoint, TripPoint};

/// Configuration for invalidation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidationConfig {
    /// Maximum plausible acceleration (m/s²)
    pub max_acceleration: f64,
    /// Maximum plausible deceleration, as a positive value (m/s²)
    pub max_deceleration: f64,
    /// Maximum plausible speed (km/h)
    pub max_speed_kmh: f64,
    /// Accuracy above which a fix is unreliable (meters)
    pub max_accuracy: f64,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            max_acceleration: 15.0,
            max_deceleration: 15.0,
            max_speed_kmh: 1500.0,
            max_accuracy: 50.0,
        }
    }
}

/// Counts from one invalidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationSummary {
    pub total_points: usize,
    pub points_marked_invalid: usize,
    pub points_already_invalid: usize,
    /// `total_points - points_already_invalid - points_marked_invalid`
    pub points_valid: usize,
}

/// Result of [`mark_invalid_points`]: counts plus the timestamps to persist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvalidationOutcome {
    pub summary: InvalidationSummary,
    /// Timestamps of the points newly flagged by this pass
    pub invalidated: Vec<i64>,
}

/// Last accepted point, the reference for the next one.
struct Reference {
    position: GpsPoint,
    timestamp: i64,
    /// m/s from the point before it, `None` for the first accepted point
    speed: Option<f64>,
}

/// Flag impossible points in place.
///
/// `points` must be sorted ascending by timestamp. Points already invalid are
/// left untouched and counted separately; valid points may only go from
/// valid to invalid.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{TripPoint, InvalidationConfig, mark_invalid_points};
///
/// let mut points = vec![
///     TripPoint::new(0, 48.8566, 2.3522),
///     TripPoint::new(10_000, 48.8575, 2.3522),
///     TripPoint::new(20_000, 48.8584, 2.3522).with_accuracy(80.0),
///     TripPoint::new(30_000, 48.8593, 2.3522),
/// ];
///
/// let outcome = mark_invalid_points(&mut points, &InvalidationConfig::default());
/// assert_eq!(outcome.invalidated, vec![20_000]);
/// assert_eq!(outcome.summary.points_valid, 3);
/// assert!(!points[2].is_valid);
/// ```
pub fn mark_invalid_points(points: &mut [TripPoint], config: &InvalidationConfig) -> InvalidationOutcome {
    let mut outcome = InvalidationOutcome::default();
    outcome.summary.total_points = points.len();

    let mut reference: Option<Reference> = None;

    for point in points.iter_mut() {
        if !point.is_valid {
            outcome.summary.points_already_invalid += 1;
            continue;
        }

        let position = point.position();
        let (speed, acceleration) = match &reference {
            None => (None, None),
            Some(prev) => {
                let dt = elapsed_seconds(prev.timestamp, point.timestamp);
                let speed = if dt > 0.0 {
                    haversine_distance(&prev.position, &position) / dt
                } else {
                    0.0
                };
                let acceleration = prev.speed.map(|prev_speed| {
                    if dt > 0.0 { (speed - prev_speed) / dt } else { 0.0 }
                });
                (Some(speed), acceleration)
            }
        };

        let too_fast = speed.is_some_and(|s| s * 3.6 > config.max_speed_kmh);
        let impossible_acceleration = acceleration.is_some_and(|a| {
            a > config.max_acceleration || a < -config.max_deceleration
        });
        let unreliable = point.accuracy > config.max_accuracy || !point.has_heading();

        if too_fast || impossible_acceleration || unreliable {
            point.is_valid = false;
            outcome.invalidated.push(point.timestamp);
            continue;
        }

        reference = Some(Reference {
            position,
            timestamp: point.timestamp,
            speed,
        });
    }

    let summary = &mut outcome.summary;
    summary.points_marked_invalid = outcome.invalidated.len();
    summary.points_valid =
        summary.total_points - summary.points_already_invalid - summary.points_marked_invalid;

    debug!(
        "[InvalidPointMarker] {} points: {} marked, {} already invalid, {} valid",
        summary.total_points,
        summary.points_marked_invalid,
        summary.points_already_invalid,
        summary.points_valid
    );

    outcome
}
