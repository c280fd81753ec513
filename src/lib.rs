//! # Trip Analyzer
//!
//! GPS trajectory analysis for recorded mobility trips.
//!
//! This library provides:
//! - Per-point noise classification and trailing-noise detection
//! - One-way invalidation of physically impossible points
//! - Distance-weighted speed estimation robust to GPS error
//! - Metric Douglas-Peucker simplification that keeps trip endpoints exact
//! - Rail mode classification (tramway, TER/RER, TGV, metro) against
//!   precomputed rail buffer polygons
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch sweeps with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trip_analyzer::{TripPoint, SpeedConfig, weighted_average_speed};
//!
//! // 1 km due north in 120 s, sampled every 10 s
//! let points: Vec<TripPoint> = (0..=12)
//!     .map(|i| TripPoint::new(i * 10_000, 48.8566 + i as f64 * 0.00075, 2.3522))
//!     .collect();
//!
//! let speed = weighted_average_speed(&points, true, &SpeedConfig::default());
//! assert!((speed.unwrap() - 30.0).abs() < 1.0); // ~30 km/h
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{AnalysisError, Result};

// Geographic utilities (distance, bearing, bounds, metric projection)
pub mod geo_utils;

// Consolidated configuration
pub mod config;
pub use config::AnalysisConfig;

// Windowed per-point features
pub mod features;
pub use features::{PointFeatures, extract_features};

// Noise tagging and trailing-noise detection
pub mod noise;
pub use noise::{
    NoiseConfig, NoiseFlags, NoiseReport, PointNoise, TrailingNoise,
    classify_noise, detect_trailing_noise, truncate_trailing_noise,
};

// One-way invalidation of impossible points
pub mod invalidation;
pub use invalidation::{InvalidationConfig, InvalidationOutcome, InvalidationSummary, mark_invalid_points};

// Speed estimation
pub mod speed;
pub use speed::{SpeedConfig, SpeedRange, percentile_speed_range, weighted_average_speed};

// Trajectory simplification
pub mod simplify;
pub use simplify::{SimplifyConfig, simplify_trajectory, try_simplify_trajectory};

// Rail mode classification
pub mod rail;
pub use rail::{
    BufferProximity, RailBuffer, RailBufferIndex, RailConfig, RailDecision, RailMode, RailModeReport,
    RailReference, classify_rail_mode, has_overlapping_longer_trip,
};

// Repository interfaces
pub mod store;
pub use store::{MemoryStore, PointStore, TripStore};

// Trip-id based facade and batch sweeps
pub mod engine;
pub use engine::{TripAnalysis, TripAnalyzer};

// ============================================================================
// Core Types
// ============================================================================

/// Trip type of a regular, user-visible trip.
pub const NORMAL_TRIP_TYPE: &str = "NORMAL";

/// Heading value for "no bearing available".
pub const UNKNOWN_HEADING: f64 = -1.0;

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use trip_analyzer::GpsPoint;
/// let point = GpsPoint::new(48.8566, 2.3522); // Paris
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Grow the box by `meters` on every side.
    pub fn expand(&self, meters: f64) -> Self {
        let reference_lat = self.min_lat.abs().max(self.max_lat.abs());
        let buffer_deg = geo_utils::meters_to_degrees(meters, reference_lat);
        Self {
            min_lat: self.min_lat - buffer_deg,
            max_lat: self.max_lat + buffer_deg,
            min_lng: self.min_lng - buffer_deg,
            max_lng: self.max_lng + buffer_deg,
        }
    }
}

/// One recorded GPS sample of a trip.
///
/// Points of a trip are ordered by `timestamp` (Unix milliseconds) with no
/// duplicates. `is_valid` only ever goes from `true` to `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPoint {
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// GPS-reported horizontal uncertainty in meters
    pub accuracy: f64,
    /// Compass heading in degrees, [`UNKNOWN_HEADING`] when unavailable
    pub heading: f64,
    pub is_valid: bool,
    /// Transport mode hint recorded by the device, if any
    pub vehicle: Option<String>,
}

impl TripPoint {
    /// Create a valid point with 5 m accuracy and a due-north heading.
    pub fn new(timestamp: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            accuracy: 5.0,
            heading: 0.0,
            is_valid: true,
            vehicle: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_valid(mut self, is_valid: bool) -> Self {
        self.is_valid = is_valid;
        self
    }

    pub fn with_vehicle(mut self, vehicle: &str) -> Self {
        self.vehicle = Some(vehicle.to_string());
        self
    }

    /// Coordinates of this sample.
    #[inline]
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// True when the device reported a usable heading.
    #[inline]
    pub fn has_heading(&self) -> bool {
        geo_utils::is_known_heading(self.heading)
    }

    /// Seconds elapsed since `earlier`, with millisecond resolution.
    #[inline]
    pub fn seconds_since(&self, earlier: &TripPoint) -> f64 {
        elapsed_seconds(earlier.timestamp, self.timestamp)
    }
}

/// Seconds between two Unix-millisecond timestamps.
#[inline]
pub(crate) fn elapsed_seconds(from_ms: i64, to_ms: i64) -> f64 {
    (to_ms - from_ms) as f64 / 1000.0
}

/// Trip-level aggregate, written upstream and read here as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub user_id: String,
    /// Unix milliseconds
    pub start_time: i64,
    /// Unix milliseconds
    pub end_time: i64,
    /// Total distance in kilometers
    pub total_distance: f64,
    /// Average speed in km/h
    pub avg_speed: f64,
    pub trip_type: String,
}

impl Trip {
    /// Duration in milliseconds.
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// Positions of a point sequence, in order.
pub(crate) fn positions(points: &[TripPoint]) -> Vec<GpsPoint> {
    points.iter().map(TripPoint::position).collect()
}

/// The subset of points still flagged valid.
pub fn valid_points(points: &[TripPoint]) -> Vec<TripPoint> {
    points.iter().filter(|p| p.is_valid).cloned().collect()
}

// ============================================================================
// Tests
// ============================================================================
