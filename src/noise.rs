//! # Noise Classification
//!
//! Rule-based tagging of GPS samples that are likely sensor noise, and
//! detection of the point from which a trip's trace degenerates into noise
//! (typically when the phone enters a building at the end of a trip).
//!
//! ## Rules
//!
//! Every rule is evaluated independently; a point is noise if any rule fires.
//!
//! | Tag | Fires when |
//! |-----|------------|
//! | `invalid_point` | point already invalidated, or heading unknown |
//! | `poor_accuracy` | accuracy above `max_accuracy` |
//! | `sudden_heading_change` | heading change above `max_heading_change` |
//! | `impossible_speed` | fast (`impossible_speed_kmh`) over a tiny hop (`impossible_speed_max_distance`) |
//! | `gps_jump` | long hop (`gps_jump_distance`) within `gps_jump_max_time` |
//! | `small_vector_angle` | sharp reversal, vector angle below `min_vector_angle` |
//! | `stationary_drift` | tiny hop (`stationary_drift_distance`) after a long pause (`stationary_drift_time`) |
//! | `slow_movement` | speed below `min_speed_threshold` |
//!
//! Tags are reported only; nothing here mutates points. Persisting a point as
//! invalid is the job of [`crate::invalidation`].

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::features::{extract_features, PointFeatures};
use crate::TripPoint;

/// Configuration for noise tagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Accuracy above which a fix is unreliable (meters)
    pub max_accuracy: f64,
    /// Heading change above which a turn is implausible (degrees)
    pub max_heading_change: f64,
    /// Speed that is implausible over a tiny hop (km/h)
    pub impossible_speed_kmh: f64,
    /// Hop length under which `impossible_speed_kmh` is implausible (meters)
    pub impossible_speed_max_distance: f64,
    /// Time window for GPS jump detection (seconds)
    pub gps_jump_max_time: f64,
    /// Hop length that counts as a jump inside `gps_jump_max_time` (meters).
    /// Two values are in use in practice, 100 m and 300 m.
    pub gps_jump_distance: f64,
    /// Vector angle below which a point is a reversal spike (degrees)
    pub min_vector_angle: f64,
    /// Hop length under which a point is drifting in place (meters)
    pub stationary_drift_distance: f64,
    /// Pause length after which a tiny hop is drift (seconds)
    pub stationary_drift_time: f64,
    /// Speed under which a point counts as not moving (km/h)
    pub min_speed_threshold: f64,
    /// Share of noise points from a position to trip end that marks the
    /// start of trailing noise (0.0-1.0)
    pub noise_threshold: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            max_accuracy: 50.0,
            max_heading_change: 90.0,
            impossible_speed_kmh: 50.0,
            impossible_speed_max_distance: 10.0,
            gps_jump_max_time: 10.0,
            gps_jump_distance: 100.0,
            min_vector_angle: 15.0,
            stationary_drift_distance: 2.0,
            stationary_drift_time: 30.0,
            min_speed_threshold: 1.5,
            noise_threshold: 0.5,
        }
    }
}

/// Which noise rules fired for a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseFlags {
    pub invalid_point: bool,
    pub poor_accuracy: bool,
    pub sudden_heading_change: bool,
    pub impossible_speed: bool,
    pub gps_jump: bool,
    pub small_vector_angle: bool,
    pub stationary_drift: bool,
    pub slow_movement: bool,
}

impl NoiseFlags {
    /// Evaluate every rule for one point.
    pub fn evaluate(point: &TripPoint, features: &PointFeatures, config: &NoiseConfig) -> Self {
        Self {
            invalid_point: !point.is_valid || !point.has_heading(),
            poor_accuracy: point.accuracy > config.max_accuracy,
            sudden_heading_change: features.heading_change > config.max_heading_change,
            impossible_speed: features.calculated_speed > config.impossible_speed_kmh
                && features.distance_from_prev < config.impossible_speed_max_distance,
            gps_jump: features.time_diff_prev > 0.0
                && features.time_diff_prev < config.gps_jump_max_time
                && features.distance_from_prev > config.gps_jump_distance,
            small_vector_angle: features
                .vector_angle
                .is_some_and(|angle| angle.abs() < config.min_vector_angle),
            stationary_drift: features.distance_from_prev < config.stationary_drift_distance
                && features.time_diff_prev > config.stationary_drift_time,
            slow_movement: features.calculated_speed < config.min_speed_threshold,
        }
    }

    /// True if any rule fired.
    pub fn is_noise(&self) -> bool {
        self.tags().next().is_some()
    }

    /// Names of the rules that fired.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> {
        [
            ("invalid_point", self.invalid_point),
            ("poor_accuracy", self.poor_accuracy),
            ("sudden_heading_change", self.sudden_heading_change),
            ("impossible_speed", self.impossible_speed),
            ("gps_jump", self.gps_jump),
            ("small_vector_angle", self.small_vector_angle),
            ("stationary_drift", self.stationary_drift),
            ("slow_movement", self.slow_movement),
        ]
        .into_iter()
        .filter(|(_, fired)| *fired)
        .map(|(tag, _)| tag)
    }
}

/// Noise verdict for one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointNoise {
    pub timestamp: i64,
    pub features: PointFeatures,
    pub flags: NoiseFlags,
    pub is_noise: bool,
}

/// Per-point noise report for a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseReport {
    /// One entry per input point, in timestamp order
    pub points: Vec<PointNoise>,
    pub total_points: usize,
    pub noise_points: usize,
    /// Number of points each tag fired for
    pub tag_counts: BTreeMap<String, usize>,
}

impl NoiseReport {
    /// Share of noise points (0.0 for an empty trip).
    pub fn noise_ratio(&self) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        self.noise_points as f64 / self.total_points as f64
    }
}

/// Tag every point of a trip.
///
/// `points` must be sorted ascending by timestamp.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{TripPoint, NoiseConfig, classify_noise};
///
/// let points = vec![
///     TripPoint::new(0, 48.8566, 2.3522),
///     TripPoint::new(10_000, 48.8575, 2.3522),
///     TripPoint::new(20_000, 48.8584, 2.3522).with_accuracy(120.0),
/// ];
///
/// let report = classify_noise(&points, &NoiseConfig::default());
/// assert!(report.points[2].flags.poor_accuracy);
/// assert!(!report.points[1].is_noise);
/// ```
pub fn classify_noise(points: &[TripPoint], config: &NoiseConfig) -> NoiseReport {
    let features = extract_features(points);

    let mut tag_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut noise_points = 0;

    let entries: Vec<PointNoise> = points
        .iter()
        .zip(features)
        .map(|(point, features)| {
            let flags = NoiseFlags::evaluate(point, &features, config);
            let is_noise = flags.is_noise();
            if is_noise {
                noise_points += 1;
            }
            for tag in flags.tags() {
                *tag_counts.entry(tag.to_string()).or_default() += 1;
            }
            PointNoise {
                timestamp: point.timestamp,
                features,
                flags,
                is_noise,
            }
        })
        .collect();

    NoiseReport {
        total_points: entries.len(),
        noise_points,
        points: entries,
        tag_counts,
    }
}

// =============================================================================
// Trailing Noise Detection
// =============================================================================

/// Where a trip's trace turns into noise, and how noisy the tail is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailingNoise {
    /// First noise point of the noisy tail, `None` if the tail never reaches
    /// the threshold
    pub noise_start_timestamp: Option<i64>,
    pub total_points_from_start: usize,
    pub noise_points_from_start: usize,
    /// `noise_points_from_start / total_points_from_start` (0 without a start)
    pub noise_percentage_from_start: f64,
    pub trip_start: Option<i64>,
    pub trip_end: Option<i64>,
}

impl TrailingNoise {
    /// Locate the noisy tail in an existing report.
    pub fn from_report(report: &NoiseReport, noise_threshold: f64) -> Self {
        let entries = &report.points;
        let mut summary = Self {
            trip_start: entries.first().map(|p| p.timestamp),
            trip_end: entries.last().map(|p| p.timestamp),
            ..Self::default()
        };

        // Backward pass: share of noise from each index to the end
        let mut noise_to_end = vec![0usize; entries.len()];
        let mut running = 0;
        for (i, entry) in entries.iter().enumerate().rev() {
            if entry.is_noise {
                running += 1;
            }
            noise_to_end[i] = running;
        }

        let candidate = (0..entries.len()).find(|&i| {
            let points_to_end = entries.len() - i;
            noise_to_end[i] as f64 / points_to_end as f64 >= noise_threshold
        });

        let Some(candidate) = candidate else {
            return summary;
        };

        let start = (candidate..entries.len())
            .find(|&i| entries[i].is_noise)
            .unwrap_or(candidate);

        let total = entries.len() - start;
        summary.noise_start_timestamp = Some(entries[start].timestamp);
        summary.total_points_from_start = total;
        summary.noise_points_from_start = noise_to_end[start];
        summary.noise_percentage_from_start = noise_to_end[start] as f64 / total as f64;
        summary
    }
}

/// Find the point from which the rest of the trip is mostly noise.
///
/// Uses `config.noise_threshold` and `config.min_speed_threshold`; the other
/// rules keep their configured values. `points` must be sorted by timestamp.
pub fn detect_trailing_noise(points: &[TripPoint], config: &NoiseConfig) -> TrailingNoise {
    let report = classify_noise(points, config);
    let summary = TrailingNoise::from_report(&report, config.noise_threshold);
    debug!(
        "[NoiseClassifier] Trailing noise over {} points: start={:?}, {}/{} noise",
        report.total_points,
        summary.noise_start_timestamp,
        summary.noise_points_from_start,
        summary.total_points_from_start
    );
    summary
}

/// Points recorded before the noisy tail.
pub fn truncate_trailing_noise<'a>(points: &'a [TripPoint], summary: &TrailingNoise) -> &'a [TripPoint] {
    match summary.noise_start_timestamp {
        Some(start) => {
            let end = points
                .iter()
                .position(|p| p.timestamp >= start)
                .unwrap_or(points.len());
            &points[..end]
        }
        None => points,
    }
}
