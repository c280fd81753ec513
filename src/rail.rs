//! # Rail Mode Classification
//!
//! Decides whether a trip was taken by rail, and on which kind of
//! infrastructure, by testing its valid points against buffered rail
//! centerline polygons.
//!
//! ## Algorithm
//! 1. Cheap exits: trips too short or too slow are never trains
//! 2. Endpoint proximity: if neither the first nor the last point is within
//!    `distance_to_train` of any buffer, the trip is not a train
//! 3. Bounding-box pre-filter: only buffers whose envelope intersects the
//!    (expanded) trip bounds are tested, via an R-tree
//! 4. Per-point membership, then the length of segments whose two endpoints
//!    are both inside a buffer (`consecutive_train_length`)
//! 5. Ratio decision against the trip's total distance:
//!    - above `min_train_ratio`: the dominant nature by in-buffer length
//!    - above `min_metro_length_ratio`: the nature of the buffer closest to
//!      either endpoint (underground lines lose the signal mid-trip)
//!    - otherwise `NOT_TRAIN`
//!
//! Buffer polygons use `x = longitude, y = latitude`.

use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, Closest, ClosestPoint, Contains, Point, Polygon};
use log::{debug, warn};
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, polyline_length, LocalProjection, EARTH_RADIUS_METERS};
use crate::{Bounds, GpsPoint, Trip, TripPoint, NORMAL_TRIP_TYPE};

/// Minimum overlap, in milliseconds, for two trips to count as duplicates
const MIN_OVERLAP_MS: i64 = 60_000;

/// Configuration for rail mode classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    /// Trips at or below this distance are never trains (km)
    pub min_train_distance: f64,
    /// Trips at or below this average speed are never trains (km/h)
    pub min_train_speed: f64,
    /// Maximum endpoint distance to a buffer for the trip to be considered (meters)
    pub distance_to_train: f64,
    /// Share of the trip distance that must lie inside buffers for a train verdict
    pub min_train_ratio: f64,
    /// Lower share accepted when an endpoint is close to a buffer (metro)
    pub min_metro_length_ratio: f64,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            min_train_distance: 1.0,
            min_train_speed: 10.0,
            distance_to_train: 80.0,
            min_train_ratio: 0.5,
            min_metro_length_ratio: 0.18,
        }
    }
}

// =============================================================================
// Reference Geometry
// =============================================================================

/// A buffered rail centerline polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct RailBuffer {
    pub id: i64,
    /// Infrastructure category, e.g. `"Tramway"`, `"TER/RER"`, `"TGV"`, `"Metro"`
    pub nature: String,
    /// Lon/lat polygon
    pub polygon: Polygon<f64>,
}

impl RailBuffer {
    pub fn new(id: i64, nature: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self {
            id,
            nature: nature.into(),
            polygon,
        }
    }

    /// Whether `point` lies inside the buffer.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        self.polygon.contains(&Point::new(point.longitude, point.latitude))
    }

    /// Distance in meters from `point` to the buffer, 0 when inside.
    pub fn distance_to(&self, point: &GpsPoint) -> f64 {
        if self.contains(point) {
            return 0.0;
        }
        // Project around the query point so it sits at the origin
        let projection = LocalProjection::new(*point);
        let local = projection.project_polygon(&self.polygon);
        match local.closest_point(&Point::new(0.0, 0.0)) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p.x().hypot(p.y()),
            Closest::Indeterminate => f64::INFINITY,
        }
    }
}

/// Nearest buffer to a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferProximity {
    pub buffer_id: i64,
    pub nature: String,
    /// Meters, 0 when the point is inside the buffer
    pub distance: f64,
}

/// Read-only access to the rail buffer reference set.
///
/// Implementations are shared by every trip-processing worker.
pub trait RailReference: Send + Sync {
    /// Buffers whose bounding box intersects `bounds`.
    fn query_buffers(&self, bounds: &Bounds) -> Vec<&RailBuffer>;

    /// The buffer of any nature closest to `point`, if there are any buffers.
    fn nearest_buffer(&self, point: &GpsPoint) -> Option<BufferProximity>;
}

/// Envelope of one buffer, indexed by position in the buffer list
#[derive(Debug, Clone)]
struct BufferEntry {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BufferEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for BufferEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        Envelope::distance_2(&self.envelope, point)
    }
}

/// In-memory rail reference backed by an R-tree of buffer envelopes.
///
/// Built once per process and shared immutably.
///
/// # Example
///
/// ```rust
/// use geo::{LineString, Polygon};
/// use trip_analyzer::{GpsPoint, RailBuffer, RailBufferIndex, RailReference};
///
/// let square = Polygon::new(
///     LineString::from(vec![(2.35, 48.85), (2.36, 48.85), (2.36, 48.86), (2.35, 48.86), (2.35, 48.85)]),
///     vec![],
/// );
/// let index = RailBufferIndex::new(vec![RailBuffer::new(1, "Tramway", square)]);
///
/// let inside = index.nearest_buffer(&GpsPoint::new(48.855, 2.355)).unwrap();
/// assert_eq!(inside.nature, "Tramway");
/// assert_eq!(inside.distance, 0.0);
/// ```
pub struct RailBufferIndex {
    buffers: Vec<RailBuffer>,
    tree: RTree<BufferEntry>,
}

impl RailBufferIndex {
    pub fn new(buffers: Vec<RailBuffer>) -> Self {
        let mut entries = Vec::with_capacity(buffers.len());
        for (idx, buffer) in buffers.iter().enumerate() {
            match buffer.polygon.bounding_rect() {
                Some(rect) => entries.push(BufferEntry {
                    idx,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                }),
                None => warn!("[RailModeClassifier] Skipping empty buffer {}", buffer.id),
            }
        }

        debug!(
            "[RailModeClassifier] Indexed {} of {} rail buffers",
            entries.len(),
            buffers.len()
        );

        Self {
            buffers,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl RailReference for RailBufferIndex {
    fn query_buffers(&self, bounds: &Bounds) -> Vec<&RailBuffer> {
        let query = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );
        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.idx)
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|idx| &self.buffers[idx]).collect()
    }

    fn nearest_buffer(&self, point: &GpsPoint) -> Option<BufferProximity> {
        let query = [point.longitude, point.latitude];
        let mut best: Option<(f64, usize)> = None;

        // Envelopes come back nearest first; stop once none can beat the best
        for entry in self.tree.nearest_neighbor_iter(&query) {
            if let Some((best_distance, _)) = best {
                let gap = envelope_gap_meters(entry.distance_2(&query).sqrt(), point.latitude);
                if gap > best_distance {
                    break;
                }
            }
            let distance = self.buffers[entry.idx].distance_to(point);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, entry.idx));
            }
        }

        best.map(|(distance, idx)| BufferProximity {
            buffer_id: self.buffers[idx].id,
            nature: self.buffers[idx].nature.clone(),
            distance,
        })
    }
}

/// Lower bound in meters for a gap of `degrees` in lon/lat space near `latitude`.
fn envelope_gap_meters(degrees: f64, latitude: f64) -> f64 {
    let worst_lat = (latitude.abs() + degrees).min(89.0).to_radians();
    degrees.to_radians() * EARTH_RADIUS_METERS * worst_lat.cos()
}

// =============================================================================
// Classification
// =============================================================================

/// Rail verdict for a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailMode {
    NotTrain,
    /// Nature tag of the rail infrastructure used
    Nature(String),
}

impl RailMode {
    pub fn as_str(&self) -> &str {
        match self {
            RailMode::NotTrain => "NOT_TRAIN",
            RailMode::Nature(nature) => nature,
        }
    }

    pub fn is_train(&self) -> bool {
        matches!(self, RailMode::Nature(_))
    }

    fn from_nature(nature: Option<&String>) -> Self {
        nature.map_or(RailMode::NotTrain, |n| RailMode::Nature(n.clone()))
    }
}

impl fmt::Display for RailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RailDecision {
    /// The trip is not in the store
    UnknownTrip,
    TooShort,
    TooSlow,
    NoValidPoints,
    EndpointsFarFromRail,
    TrainRatio,
    MetroRatio,
    BelowRatios,
}

/// Rail classification result with the measurements behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct RailModeReport {
    pub mode: RailMode,
    pub decision: RailDecision,
    /// Meters covered by segments with both endpoints inside a buffer
    pub consecutive_train_length: f64,
    /// Meters along the in-buffer points, joined regardless of adjacency
    pub total_in_buffer_length: f64,
    pub dominant_nature: Option<String>,
    pub closest_nature: Option<String>,
    pub points_in_buffer: usize,
    pub candidate_buffers: usize,
}

impl RailModeReport {
    pub(crate) fn early_exit(decision: RailDecision) -> Self {
        Self {
            mode: RailMode::NotTrain,
            decision,
            consecutive_train_length: 0.0,
            total_in_buffer_length: 0.0,
            dominant_nature: None,
            closest_nature: None,
            points_in_buffer: 0,
            candidate_buffers: 0,
        }
    }
}

/// Classify a trip's rail mode.
///
/// `points` are the trip's valid points in timestamp order. The trip's
/// `total_distance` (km) and `avg_speed` (km/h) drive the cheap exits and
/// the ratio thresholds.
pub fn classify_rail_mode(
    points: &[TripPoint],
    trip: &Trip,
    reference: &dyn RailReference,
    config: &RailConfig,
) -> RailModeReport {
    if trip.total_distance <= config.min_train_distance {
        debug!("[RailModeClassifier] trip {}: too short ({:.2} km)", trip.id, trip.total_distance);
        return RailModeReport::early_exit(RailDecision::TooShort);
    }
    if trip.avg_speed <= config.min_train_speed {
        debug!("[RailModeClassifier] trip {}: too slow ({:.1} km/h)", trip.id, trip.avg_speed);
        return RailModeReport::early_exit(RailDecision::TooSlow);
    }

    let positions: Vec<GpsPoint> = points
        .iter()
        .map(TripPoint::position)
        .filter(GpsPoint::is_valid)
        .collect();
    let (Some(first), Some(last)) = (positions.first(), positions.last()) else {
        return RailModeReport::early_exit(RailDecision::NoValidPoints);
    };

    let near_rail = |p: &GpsPoint| {
        reference
            .nearest_buffer(p)
            .is_some_and(|b| b.distance <= config.distance_to_train)
    };
    if !near_rail(first) && !near_rail(last) {
        debug!("[RailModeClassifier] trip {}: both endpoints far from rail", trip.id);
        return RailModeReport::early_exit(RailDecision::EndpointsFarFromRail);
    }

    let bounds = match Bounds::from_points(&positions) {
        Some(b) => b.expand(config.distance_to_train),
        None => return RailModeReport::early_exit(RailDecision::NoValidPoints),
    };
    let candidates = reference.query_buffers(&bounds);

    let natures: Vec<Option<&String>> = positions
        .iter()
        .map(|p| candidates.iter().find(|b| b.contains(p)).map(|b| &b.nature))
        .collect();

    let mut consecutive_train_length = 0.0;
    let mut length_by_nature: BTreeMap<String, f64> = BTreeMap::new();
    for (i, pair) in positions.windows(2).enumerate() {
        if let (Some(nature), Some(_)) = (natures[i], natures[i + 1]) {
            let length = haversine_distance(&pair[0], &pair[1]);
            consecutive_train_length += length;
            *length_by_nature.entry(nature.clone()).or_insert(0.0) += length;
        }
    }

    let in_buffer: Vec<GpsPoint> = positions
        .iter()
        .zip(&natures)
        .filter(|(_, nature)| nature.is_some())
        .map(|(p, _)| *p)
        .collect();
    let total_in_buffer_length = polyline_length(&in_buffer);

    let dominant_nature = dominant_nature(&length_by_nature);
    let closest_nature = closest_nature(&candidates, first, last, config.distance_to_train);

    let consecutive_km = consecutive_train_length / 1000.0;
    let (mode, decision) = if consecutive_km > config.min_train_ratio * trip.total_distance {
        (RailMode::from_nature(dominant_nature.as_ref()), RailDecision::TrainRatio)
    } else if consecutive_km > config.min_metro_length_ratio * trip.total_distance {
        (RailMode::from_nature(closest_nature.as_ref()), RailDecision::MetroRatio)
    } else {
        (RailMode::NotTrain, RailDecision::BelowRatios)
    };

    debug!(
        "[RailModeClassifier] trip {}: {:.0} m consecutive of {:.2} km, {} candidate buffers -> {}",
        trip.id,
        consecutive_train_length,
        trip.total_distance,
        candidates.len(),
        mode
    );

    RailModeReport {
        mode,
        decision,
        consecutive_train_length,
        total_in_buffer_length,
        dominant_nature,
        closest_nature,
        points_in_buffer: in_buffer.len(),
        candidate_buffers: candidates.len(),
    }
}

/// Nature with the greatest length; ties go to the alphabetically first.
fn dominant_nature(length_by_nature: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (nature, &length) in length_by_nature {
        if best.map_or(true, |(_, best_length)| length > best_length) {
            best = Some((nature, length));
        }
    }
    best.map(|(nature, _)| nature.clone())
}

/// Nature of the candidate nearest to either endpoint, if within `max_distance`.
fn closest_nature(
    candidates: &[&RailBuffer],
    first: &GpsPoint,
    last: &GpsPoint,
    max_distance: f64,
) -> Option<String> {
    let mut best: Option<(f64, &RailBuffer)> = None;
    for buffer in candidates {
        let distance = buffer.distance_to(first).min(buffer.distance_to(last));
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, buffer));
        }
    }
    best.filter(|(distance, _)| *distance < max_distance)
        .map(|(_, buffer)| buffer.nature.clone())
}

/// Whether another NORMAL trip of the same user overlaps `trip` by more than
/// a minute and lasts at least as long.
///
/// Used to suppress shorter duplicate fragments of one journey.
pub fn has_overlapping_longer_trip(trip: &Trip, user_trips: &[Trip]) -> bool {
    let duration = trip.duration();
    user_trips.iter().any(|other| {
        let overlap = other.end_time.min(trip.end_time) - other.start_time.max(trip.start_time);
        other.id != trip.id
            && other.user_id == trip.user_id
            && other.trip_type == NORMAL_TRIP_TYPE
            && other.duration() >= duration
            && overlap > MIN_OVERLAP_MS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    const BASE_LAT: f64 = 48.80;
    const BASE_LNG: f64 = 2.35;
    /// Half-width of the test buffers in degrees of longitude (~15 m)
    const HALF_WIDTH: f64 = 0.0002;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Rectangle hugging the test track between two latitudes.
    fn track_buffer(id: i64, nature: &str, min_lat: f64, max_lat: f64) -> RailBuffer {
        let (w, e) = (BASE_LNG - HALF_WIDTH, BASE_LNG + HALF_WIDTH);
        RailBuffer::new(
            id,
            nature,
            Polygon::new(
                LineString::from(vec![(w, min_lat), (e, min_lat), (e, max_lat), (w, max_lat), (w, min_lat)]),
                vec![],
            ),
        )
    }

    /// 5 km due north along the track, a point every ~100 m at 45 km/h.
    fn northbound_points() -> Vec<TripPoint> {
        (0..=50)
            .map(|i| TripPoint::new(i * 8_000, BASE_LAT + i as f64 * 0.0009, BASE_LNG))
            .collect()
    }

    fn trip(total_distance: f64, avg_speed: f64) -> Trip {
        Trip {
            id: "trip-1".to_string(),
            user_id: "user-1".to_string(),
            start_time: 0,
            end_time: 400_000,
            total_distance,
            avg_speed,
            trip_type: NORMAL_TRIP_TYPE.to_string(),
        }
    }

    #[test]
    fn test_train_ratio_returns_dominant_nature() {
        // Points 0..=45 inside: 90% of the path
        let index = RailBufferIndex::new(vec![track_buffer(1, "TER/RER", BASE_LAT - 0.0005, 48.8406)]);
        let report = classify_rail_mode(&northbound_points(), &trip(5.0, 45.0), &index, &RailConfig::default());
        assert_eq!(report.mode, RailMode::Nature("TER/RER".to_string()));
        assert!(report.mode.is_train());
        assert_eq!(report.decision, RailDecision::TrainRatio);
        assert_eq!(report.points_in_buffer, 46);
        assert!(approx_eq(report.consecutive_train_length, 4503.0, 10.0));
    }

    #[test]
    fn test_metro_ratio_returns_closest_nature() {
        // Points 0..=15 inside: ~30% of the path, start in the station
        let index = RailBufferIndex::new(vec![
            track_buffer(1, "Metro", BASE_LAT - 0.0005, 48.8136),
            track_buffer(2, "TGV", 47.0, 47.1),
        ]);
        let report = classify_rail_mode(&northbound_points(), &trip(5.0, 45.0), &index, &RailConfig::default());
        assert_eq!(report.decision, RailDecision::MetroRatio);
        assert_eq!(report.mode.as_str(), "Metro");
        assert_eq!(report.closest_nature.as_deref(), Some("Metro"));
        assert_eq!(report.candidate_buffers, 1);
    }

    #[test]
    fn test_far_endpoints_not_train_regardless_of_speed() {
        // Middle 60% inside, both endpoints ~900 m away
        let index = RailBufferIndex::new(vec![track_buffer(1, "TER/RER", 48.8085, 48.8365)]);
        for (distance, speed) in [(5.0, 45.0), (500.0, 300.0)] {
            let report = classify_rail_mode(&northbound_points(), &trip(distance, speed), &index, &RailConfig::default());
            assert_eq!(report.mode, RailMode::NotTrain);
            assert_eq!(report.decision, RailDecision::EndpointsFarFromRail);
        }
    }

    #[test]
    fn test_below_ratios() {
        // Points 0..=5 inside: ~10% of the path
        let index = RailBufferIndex::new(vec![track_buffer(1, "Tramway", BASE_LAT - 0.0005, 48.8046)]);
        let report = classify_rail_mode(&northbound_points(), &trip(5.0, 45.0), &index, &RailConfig::default());
        assert_eq!(report.mode, RailMode::NotTrain);
        assert!(!report.mode.is_train());
        assert_eq!(report.decision, RailDecision::BelowRatios);
    }

    #[test]
    fn test_cheap_exits() {
        let index = RailBufferIndex::new(vec![track_buffer(1, "TER/RER", BASE_LAT - 0.0005, 48.8406)]);
        let config = RailConfig::default();
        let points = northbound_points();

        assert_eq!(classify_rail_mode(&points, &trip(1.0, 45.0), &index, &config).decision, RailDecision::TooShort);
        assert_eq!(classify_rail_mode(&points, &trip(5.0, 10.0), &index, &config).decision, RailDecision::TooSlow);
        assert_eq!(classify_rail_mode(&[], &trip(5.0, 45.0), &index, &config).decision, RailDecision::NoValidPoints);
    }

    #[test]
    fn test_empty_reference_is_not_train() {
        let index = RailBufferIndex::new(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        let report = classify_rail_mode(&northbound_points(), &trip(5.0, 45.0), &index, &RailConfig::default());
        assert_eq!(report.mode.to_string(), "NOT_TRAIN");
    }

    #[test]
    fn test_nearest_buffer_distance() {
        let index = RailBufferIndex::new(vec![
            track_buffer(1, "Tramway", 48.79, 48.81),
            track_buffer(2, "TGV", 49.5, 49.6),
        ]);
        // ~50 m east of the buffer edge
        let lng = BASE_LNG + HALF_WIDTH + 50.0 / (111_195.08 * 48.8_f64.to_radians().cos());
        let nearest = index.nearest_buffer(&GpsPoint::new(48.80, lng)).unwrap();
        assert_eq!(nearest.buffer_id, 1);
        assert!(approx_eq(nearest.distance, 50.0, 1.0));
    }

    #[test]
    fn test_query_buffers_prefilters_by_bounds() {
        let index = RailBufferIndex::new(vec![
            track_buffer(1, "Tramway", 48.79, 48.81),
            track_buffer(2, "TGV", 49.5, 49.6),
            track_buffer(3, "Metro", 48.805, 48.806),
        ]);
        assert_eq!(index.len(), 3);
        let bounds = Bounds { min_lat: 48.80, max_lat: 48.82, min_lng: 2.34, max_lng: 2.36 };
        let ids: Vec<i64> = index.query_buffers(&bounds).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_dominant_nature_ties_alphabetical() {
        let mut lengths = BTreeMap::new();
        lengths.insert("Tramway".to_string(), 500.0);
        lengths.insert("Metro".to_string(), 500.0);
        lengths.insert("TGV".to_string(), 100.0);
        assert_eq!(dominant_nature(&lengths).as_deref(), Some("Metro"));
        assert_eq!(dominant_nature(&BTreeMap::new()), None);
    }

    #[test]
    fn test_total_in_buffer_length_spans_gaps() {
        // Two in-buffer stretches separated by a gap
        let index = RailBufferIndex::new(vec![
            track_buffer(1, "TER/RER", BASE_LAT - 0.0005, 48.8181),
            track_buffer(2, "TER/RER", 48.8262, 48.8460),
        ]);
        let report = classify_rail_mode(&northbound_points(), &trip(5.0, 45.0), &index, &RailConfig::default());
        assert!(report.total_in_buffer_length > report.consecutive_train_length);
    }

    fn user_trip(id: &str, start: i64, end: i64, trip_type: &str) -> Trip {
        Trip {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            start_time: start,
            end_time: end,
            total_distance: 5.0,
            avg_speed: 30.0,
            trip_type: trip_type.to_string(),
        }
    }

    #[test]
    fn test_overlapping_longer_trip() {
        let current = user_trip("a", 1_000_000, 1_600_000, NORMAL_TRIP_TYPE);
        assert!(!has_overlapping_longer_trip(&current, &[]));
        assert!(!has_overlapping_longer_trip(&current, &[current.clone()]));

        // Longer and overlapping by 300 s
        assert!(has_overlapping_longer_trip(&current, &[user_trip("b", 1_300_000, 2_000_000, NORMAL_TRIP_TYPE)]));
        // Overlap of exactly one minute is not enough
        assert!(!has_overlapping_longer_trip(&current, &[user_trip("c", 1_540_000, 2_200_000, NORMAL_TRIP_TYPE)]));
        // One minute and one millisecond is
        assert!(has_overlapping_longer_trip(&current, &[user_trip("c", 1_539_999, 2_200_000, NORMAL_TRIP_TYPE)]));
        // Shorter trip
        assert!(!has_overlapping_longer_trip(&current, &[user_trip("d", 1_100_000, 1_200_000, NORMAL_TRIP_TYPE)]));
        // Not a NORMAL trip
        assert!(!has_overlapping_longer_trip(&current, &[user_trip("e", 900_000, 2_000_000, "MERGED")]));
    }
}
