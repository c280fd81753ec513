//! Windowed per-point features.
//!
//! Each point is described by its relation to the immediately preceding and
//! following samples. Points are read by index from a timestamp-sorted slice,
//! so the previous/next neighbours are `i - 1` and `i + 1`.

use serde::{Deserialize, Serialize};

use crate::geo_utils::{bearing_delta, haversine_distance, vector_angle};
use crate::TripPoint;

/// Features of one point relative to its neighbours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFeatures {
    /// Meters from the previous point (0 for the first point)
    pub distance_from_prev: f64,
    /// Seconds since the previous point (0 for the first point)
    pub time_diff_prev: f64,
    /// km/h from the previous point (0 when the time difference is not positive)
    pub calculated_speed: f64,
    /// Degrees between this heading and the previous one (0 when unknown)
    pub heading_change: f64,
    /// Angle between the bearings to the next and previous points
    pub vector_angle: Option<f64>,
}

/// Speed in km/h for `distance` meters covered in `seconds`.
///
/// ```rust
/// use trip_analyzer::features::speed_kmh;
///
/// assert_eq!(speed_kmh(1000.0, 3600.0), 1.0);
/// assert_eq!(speed_kmh(1000.0, 0.0), 0.0);
/// ```
#[inline]
pub fn speed_kmh(distance: f64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    distance * 3.6 / seconds
}

/// Extract features for every point.
///
/// `points` must be sorted ascending by timestamp. The output has one entry
/// per input point, in the same order.
pub fn extract_features(points: &[TripPoint]) -> Vec<PointFeatures> {
    (0..points.len())
        .map(|i| features_at(points, i))
        .collect()
}

fn features_at(points: &[TripPoint], i: usize) -> PointFeatures {
    let cur = &points[i];
    let prev = i.checked_sub(1).map(|j| &points[j]);
    let next = points.get(i + 1);

    let Some(prev) = prev else {
        return PointFeatures::default();
    };

    let distance_from_prev = haversine_distance(&prev.position(), &cur.position());
    let time_diff_prev = cur.seconds_since(prev);

    PointFeatures {
        distance_from_prev,
        time_diff_prev,
        calculated_speed: speed_kmh(distance_from_prev, time_diff_prev),
        heading_change: bearing_delta(cur.heading, prev.heading).unwrap_or(0.0),
        vector_angle: vector_angle(
            Some(&prev.position()),
            &cur.position(),
            next.map(TripPoint::position).as_ref(),
        ),
    }
}
