//! # Geographic Utilities
//!
//! Core geographic computation utilities for GPS trip analysis.
//!
//! This module provides the geometry every other component builds on. All
//! functions expect WGS84 coordinates (latitude/longitude in degrees).
//!
//! ## Overview
//!
//! - Distances: [`haversine_distance`], [`polyline_length`], [`meters_to_degrees`]
//! - Directions: [`bearing`], [`bearing_delta`], [`vector_angle`]
//! - Extents: [`compute_bounds`], [`compute_center`]
//! - Metric frame: [`LocalProjection`]
//!
//! ## Example
//!
//! ```rust
//! use trip_analyzer::{GpsPoint, geo_utils};
//!
//! let trace = [
//!     GpsPoint::new(45.7640, 4.8357),  // Lyon, Place Bellecour
//!     GpsPoint::new(45.7652, 4.8371),
//!     GpsPoint::new(45.7668, 4.8384),
//! ];
//!
//! let meters = geo_utils::polyline_length(&trace);
//! assert!(meters > 300.0 && meters < 400.0);
//!
//! let heading = geo_utils::bearing(&trace[0], &trace[2]);
//! assert!(heading > 0.0 && heading < 90.0); // north-east
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Vector angle
//!
//! The vector angle at a point is the difference between the bearing to the
//! next point and the bearing to the previous point. A vehicle driving
//! straight through has an angle near 180°. A GPS spike that jumps away and
//! comes straight back puts both neighbours in the same direction, so the
//! angle collapses towards 0°.
//!
//! ### Local projection
//!
//! Simplification tolerances and buffer distances are expressed in meters. A
//! degree of longitude shrinks with latitude, so those computations run in a
//! local equirectangular frame anchored at the trip, which is accurate to
//! well under a meter over the extent of a single trip.

use geo::{Coord, Distance, Haversine, MapCoords, Point, Polygon};
use crate::{Bounds, GpsPoint};

/// Mean Earth radius used by the local projection (meters).
pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two points (haversine).
///
/// Returns the distance in meters along the Earth's surface. Symmetric, and
/// exactly 0 for coincident points.
///
/// The sphere has geo's mean Earth radius of 6 371 008.8 m, not the rounder
/// 6 371 000 m. Results run 1.4 ppm longer, about half a meter between
/// Paris and Lyon.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{GpsPoint, geo_utils};
///
/// let paris = GpsPoint::new(48.8566, 2.3522);
/// let lyon = GpsPoint::new(45.7640, 4.8357);
///
/// let distance = geo_utils::haversine_distance(&paris, &lyon);
/// assert!((distance - 392_000.0).abs() < 2000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Length in meters of a trace, summed over consecutive points.
///
/// Empty or single-point tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Degrees spanning at least `meters` in both axes near `latitude`.
///
/// Returns the larger of the latitude and longitude conversions so that a
/// square search box built from it always contains the metric radius.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Direction Functions
// =============================================================================

/// Initial bearing from `from` to `to`, in degrees clockwise from north, in `[0, 360)`.
///
/// Coincident points return 0.
pub fn bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Circular difference between two headings, in `[0, 180]`.
///
/// Returns `None` when either heading is unknown (negative, conventionally `-1`).
///
/// ```rust
/// use trip_analyzer::geo_utils::bearing_delta;
///
/// assert_eq!(bearing_delta(350.0, 10.0), Some(20.0));
/// assert_eq!(bearing_delta(-1.0, 10.0), None);
/// ```
pub fn bearing_delta(h1: f64, h2: f64) -> Option<f64> {
    if !is_known_heading(h1) || !is_known_heading(h2) {
        return None;
    }
    let diff = (h1 - h2).abs() % 360.0;
    Some(diff.min(360.0 - diff))
}

/// True when a heading value carries a real bearing.
#[inline]
pub fn is_known_heading(heading: f64) -> bool {
    heading.is_finite() && heading >= 0.0
}

/// Angle at `cur` between the bearing to `next` and the bearing to `prev`.
///
/// Normalized to `(-180, 180]`. Returns `None` at sequence boundaries. Values
/// near 0 mean both neighbours lie in the same direction, i.e. the path
/// reverses sharply at `cur`.
pub fn vector_angle(prev: Option<&GpsPoint>, cur: &GpsPoint, next: Option<&GpsPoint>) -> Option<f64> {
    let (prev, next) = (prev?, next?);
    let forward = bearing(cur, next);
    let backward = bearing(cur, prev);
    Some(normalize_angle(forward - backward))
}

fn normalize_angle(degrees: f64) -> f64 {
    let mut angle = degrees % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Bounding box of a trace.
///
/// For empty input, returns a bounds with MIN/MAX values that intersects nothing.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds { min_lat, max_lat, min_lng, max_lng }
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Compute the arithmetic centroid of a GPS track. Returns (0, 0) for empty input.
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    GpsPoint::new(sum_lat / n, sum_lng / n)
}

// =============================================================================
// Metric Projection
// =============================================================================

/// Local equirectangular projection around an origin.
///
/// `x` grows east and `y` grows north, both in meters from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: GpsPoint,
    cos_origin_lat: f64,
}

impl LocalProjection {
    /// Create a projection anchored at `origin`.
    pub fn new(origin: GpsPoint) -> Self {
        Self {
            origin,
            cos_origin_lat: origin.latitude.to_radians().cos(),
        }
    }

    /// Create a projection anchored at the centroid of `points`.
    pub fn for_points(points: &[GpsPoint]) -> Self {
        Self::new(compute_center(points))
    }

    /// Project a WGS84 point to local meters.
    pub fn project(&self, point: &GpsPoint) -> Coord<f64> {
        Coord {
            x: (point.longitude - self.origin.longitude).to_radians()
                * EARTH_RADIUS_METERS
                * self.cos_origin_lat,
            y: (point.latitude - self.origin.latitude).to_radians() * EARTH_RADIUS_METERS,
        }
    }

    /// Project a lon/lat polygon into local meters.
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.project(&GpsPoint::new(c.y, c.x)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
