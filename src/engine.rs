//! Trip-id based facade over the analysis components.
//!
//! [`TripAnalyzer`] fetches a trip's points and summary from its store, runs
//! the requested component and writes invalidation flags back. Unknown trips
//! give neutral results (empty reports, `None`, `NOT_TRAIN`, `false`) rather
//! than errors; only store failures and invalid parameters are errors.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::invalidation::{mark_invalid_points, InvalidationConfig, InvalidationSummary};
use crate::noise::{classify_noise, NoiseConfig, NoiseReport, TrailingNoise};
use crate::rail::{
    classify_rail_mode, has_overlapping_longer_trip, RailConfig, RailDecision, RailModeReport, RailReference,
};
use crate::simplify::try_simplify_trajectory;
use crate::speed::{percentile_speed_range, weighted_average_speed, SpeedConfig, SpeedRange};
use crate::store::{PointStore, TripStore};
use crate::{valid_points, AnalysisConfig, Trip, TripPoint};

/// Everything the pipeline derives for one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripAnalysis {
    pub trip_id: String,
    pub total_points: usize,
    pub noise_points: usize,
    pub trailing_noise: TrailingNoise,
    pub invalidation: InvalidationSummary,
    /// km/h over the valid points
    pub avg_speed_weighted: Option<f64>,
    pub simplified: Vec<TripPoint>,
    pub rail: RailModeReport,
    pub has_overlapping_longer_trip: bool,
}

/// Runs the analysis components against stored trips.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use trip_analyzer::{AnalysisConfig, MemoryStore, RailBufferIndex, TripAnalyzer, TripPoint};
///
/// let store = Arc::new(MemoryStore::new());
/// store.insert_points("trip-1", (0..=12)
///     .map(|i| TripPoint::new(i * 10_000, 48.8566 + i as f64 * 0.00075, 2.3522))
///     .collect()).unwrap();
///
/// let analyzer = TripAnalyzer::new(
///     store,
///     Arc::new(RailBufferIndex::new(Vec::new())),
///     AnalysisConfig::default(),
/// );
/// let speed = analyzer.weighted_average_speed("trip-1", true).unwrap();
/// assert!((speed.unwrap() - 30.0).abs() < 1.0);
/// ```
pub struct TripAnalyzer<S> {
    store: Arc<S>,
    rail: Arc<dyn RailReference>,
    config: AnalysisConfig,
}

impl<S: PointStore + TripStore> TripAnalyzer<S> {
    pub fn new(store: Arc<S>, rail: Arc<dyn RailReference>, config: AnalysisConfig) -> Self {
        Self { store, rail, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn valid_trip_points(&self, trip_id: &str) -> Result<Vec<TripPoint>> {
        Ok(valid_points(&self.store.get_points(trip_id)?))
    }

    /// Per-point noise tags for every stored point of the trip.
    pub fn analyze_noise(&self, trip_id: &str) -> Result<NoiseReport> {
        self.analyze_noise_with(trip_id, &self.config.noise)
    }

    /// [`TripAnalyzer::analyze_noise`] with thresholds for this call only.
    pub fn analyze_noise_with(&self, trip_id: &str, config: &NoiseConfig) -> Result<NoiseReport> {
        let points = self.store.get_points(trip_id)?;
        let report = classify_noise(&points, config);
        debug!(
            "[NoiseClassifier] trip {}: {}/{} noise points",
            trip_id, report.noise_points, report.total_points
        );
        Ok(report)
    }

    /// Where the trip's trace degenerates into noise, if it does.
    pub fn detect_trailing_noise(&self, trip_id: &str) -> Result<TrailingNoise> {
        self.detect_trailing_noise_with(trip_id, &self.config.noise)
    }

    /// [`TripAnalyzer::detect_trailing_noise`] with thresholds for this call
    /// only, e.g. a different `noise_threshold` or `min_speed_threshold`.
    pub fn detect_trailing_noise_with(&self, trip_id: &str, config: &NoiseConfig) -> Result<TrailingNoise> {
        let report = self.analyze_noise_with(trip_id, config)?;
        Ok(TrailingNoise::from_report(&report, config.noise_threshold))
    }

    /// Flag impossible points and persist the flags. Running it again on the
    /// same trip marks nothing new.
    pub fn mark_invalid_speed_jumps(&self, trip_id: &str) -> Result<InvalidationSummary> {
        self.mark_invalid_speed_jumps_with(trip_id, &self.config.invalidation)
    }

    /// [`TripAnalyzer::mark_invalid_speed_jumps`] with speed and acceleration
    /// caps for this call only.
    pub fn mark_invalid_speed_jumps_with(
        &self,
        trip_id: &str,
        config: &InvalidationConfig,
    ) -> Result<InvalidationSummary> {
        let mut points = self.store.get_points(trip_id)?;
        let outcome = mark_invalid_points(&mut points, config);
        self.store.set_invalid(trip_id, &outcome.invalidated)?;

        info!(
            "[InvalidPointMarker] trip {}: {} marked invalid, {} valid",
            trip_id, outcome.summary.points_marked_invalid, outcome.summary.points_valid
        );
        Ok(outcome.summary)
    }

    /// Distance-weighted average speed in km/h, `None` when nothing is measurable.
    pub fn weighted_average_speed(&self, trip_id: &str, filter_to_valid: bool) -> Result<Option<f64>> {
        self.weighted_average_speed_with(trip_id, filter_to_valid, &self.config.speed)
    }

    /// [`TripAnalyzer::weighted_average_speed`] with caps for this call only.
    pub fn weighted_average_speed_with(
        &self,
        trip_id: &str,
        filter_to_valid: bool,
        config: &SpeedConfig,
    ) -> Result<Option<f64>> {
        let points = self.store.get_points(trip_id)?;
        Ok(weighted_average_speed(&points, filter_to_valid, config))
    }

    /// Central `percentage` of segment speeds. Fails for a percentage outside (0, 100].
    pub fn percentile_speed_range(
        &self,
        trip_id: &str,
        filter_to_valid: bool,
        percentage: f64,
    ) -> Result<SpeedRange> {
        let points = self.store.get_points(trip_id)?;
        percentile_speed_range(&points, filter_to_valid, percentage, &self.config.speed)
    }

    /// Simplified valid points of the trip. Falls back to the valid points
    /// themselves if simplification fails.
    pub fn simplify_trip(&self, trip_id: &str) -> Result<Vec<TripPoint>> {
        let points = self.valid_trip_points(trip_id)?;
        Ok(self.simplify_points(trip_id, points))
    }

    fn simplify_points(&self, trip_id: &str, points: Vec<TripPoint>) -> Vec<TripPoint> {
        let config = &self.config.simplify;
        match try_simplify_trajectory(&points, config.tolerance_meters, config.high_quality) {
            Ok(simplified) => simplified,
            Err(e) => {
                warn!(
                    "[TrajectorySimplifier] trip {}: keeping {} points: {}",
                    trip_id,
                    points.len(),
                    e
                );
                points
            }
        }
    }

    /// Rail verdict for the trip, `NOT_TRAIN` for unknown trips.
    pub fn classify_rail_mode(&self, trip_id: &str) -> Result<RailModeReport> {
        self.classify_rail_mode_with(trip_id, &self.config.rail)
    }

    /// [`TripAnalyzer::classify_rail_mode`] with thresholds for this call only.
    pub fn classify_rail_mode_with(&self, trip_id: &str, config: &RailConfig) -> Result<RailModeReport> {
        let Some(trip) = self.store.get_trip(trip_id)? else {
            return Ok(RailModeReport::early_exit(RailDecision::UnknownTrip));
        };
        let points = self.valid_trip_points(trip_id)?;
        Ok(self.classify_points(&trip, &points, config))
    }

    fn classify_points(&self, trip: &Trip, points: &[TripPoint], config: &RailConfig) -> RailModeReport {
        let report = classify_rail_mode(points, trip, self.rail.as_ref(), config);
        info!(
            "[RailModeClassifier] trip {}: {} ({:?})",
            trip.id, report.mode, report.decision
        );
        report
    }

    /// Whether a longer NORMAL trip of the same user overlaps this one.
    pub fn has_overlapping_longer_trip(&self, trip_id: &str) -> Result<bool> {
        let Some(trip) = self.store.get_trip(trip_id)? else {
            return Ok(false);
        };
        self.overlaps_longer(&trip)
    }

    fn overlaps_longer(&self, trip: &Trip) -> Result<bool> {
        let user_trips = self.store.get_user_trips(&trip.user_id)?;
        Ok(has_overlapping_longer_trip(trip, &user_trips))
    }

    /// Full pipeline for one trip: noise, invalidation (persisted), speed,
    /// simplification, rail mode and duplicate detection.
    pub fn analyze_trip(&self, trip_id: &str) -> Result<TripAnalysis> {
        let trip = self
            .store
            .get_trip(trip_id)?
            .ok_or_else(|| AnalysisError::NotFound(trip_id.to_string()))?;
        let mut points = self.store.get_points(trip_id)?;

        let noise = classify_noise(&points, &self.config.noise);
        let trailing_noise = TrailingNoise::from_report(&noise, self.config.noise.noise_threshold);

        let outcome = mark_invalid_points(&mut points, &self.config.invalidation);
        self.store.set_invalid(trip_id, &outcome.invalidated)?;

        let valid = valid_points(&points);
        let avg_speed_weighted = weighted_average_speed(&valid, true, &self.config.speed);
        let rail = self.classify_points(&trip, &valid, &self.config.rail);
        let has_overlapping_longer_trip = self.overlaps_longer(&trip)?;
        let simplified = self.simplify_points(trip_id, valid);

        Ok(TripAnalysis {
            trip_id: trip.id,
            total_points: noise.total_points,
            noise_points: noise.noise_points,
            trailing_noise,
            invalidation: outcome.summary,
            avg_speed_weighted,
            simplified,
            rail,
            has_overlapping_longer_trip,
        })
    }

    /// Analyze trips one after another. A failing trip is logged and
    /// reported in its slot; it never stops the sweep.
    pub fn analyze_trips<T: AsRef<str>>(&self, trip_ids: &[T]) -> Vec<Result<TripAnalysis>> {
        let results: Vec<Result<TripAnalysis>> = trip_ids
            .iter()
            .map(|id| self.analyze_trip_logged(id.as_ref()))
            .collect();
        log_sweep(&results);
        results
    }

    /// Analyze trips across the rayon pool. Same results as
    /// [`TripAnalyzer::analyze_trips`], in input order.
    #[cfg(feature = "parallel")]
    pub fn analyze_trips_parallel<T: AsRef<str> + Sync>(&self, trip_ids: &[T]) -> Vec<Result<TripAnalysis>> {
        use rayon::prelude::*;

        let results: Vec<Result<TripAnalysis>> = trip_ids
            .par_iter()
            .map(|id| self.analyze_trip_logged(id.as_ref()))
            .collect();
        log_sweep(&results);
        results
    }

    fn analyze_trip_logged(&self, trip_id: &str) -> Result<TripAnalysis> {
        let result = self.analyze_trip(trip_id);
        if let Err(e) = &result {
            warn!("[TripAnalyzer] trip {} failed: {}", trip_id, e);
        }
        result
    }
}

fn log_sweep(results: &[Result<TripAnalysis>]) {
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        "[TripAnalyzer] Analyzed {} trips, {} failed",
        results.len() - failed,
        failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, RailBuffer, RailBufferIndex, RailMode, NORMAL_TRIP_TYPE};
    use geo::{LineString, Polygon};

    /// 5 km due north at ~45 km/h, a point every 8 s.
    fn track() -> Vec<TripPoint> {
        (0..=50)
            .map(|i| TripPoint::new(1_000_000 + i * 8_000, 48.80 + i as f64 * 0.0009, 2.35))
            .collect()
    }

    fn trip(id: &str, start: i64, end: i64) -> Trip {
        Trip {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            start_time: start,
            end_time: end,
            total_distance: 5.0,
            avg_speed: 45.0,
            trip_type: NORMAL_TRIP_TYPE.to_string(),
        }
    }

    /// TER/RER buffer over the first 90% of the track.
    fn rail_index() -> Arc<RailBufferIndex> {
        let (w, e, s, n) = (2.3498, 2.3502, 48.7995, 48.8406);
        let polygon = Polygon::new(
            LineString::from(vec![(w, s), (e, s), (e, n), (w, n), (w, s)]),
            vec![],
        );
        Arc::new(RailBufferIndex::new(vec![RailBuffer::new(7, "TER/RER", polygon)]))
    }

    fn analyzer(store: MemoryStore) -> TripAnalyzer<MemoryStore> {
        TripAnalyzer::new(Arc::new(store), rail_index(), AnalysisConfig::default())
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_trip(trip("t1", 1_000_000, 1_400_000)).unwrap();
        store.insert_points("t1", track()).unwrap();
        store
    }

    #[test]
    fn test_unknown_trip_is_neutral() {
        let analyzer = analyzer(MemoryStore::new());
        assert_eq!(analyzer.analyze_noise("nope").unwrap().total_points, 0);
        assert_eq!(analyzer.detect_trailing_noise("nope").unwrap().noise_start_timestamp, None);
        assert_eq!(analyzer.weighted_average_speed("nope", true).unwrap(), None);
        assert_eq!(analyzer.mark_invalid_speed_jumps("nope").unwrap().total_points, 0);
        assert!(analyzer.simplify_trip("nope").unwrap().is_empty());
        assert!(!analyzer.has_overlapping_longer_trip("nope").unwrap());

        let rail = analyzer.classify_rail_mode("nope").unwrap();
        assert_eq!(rail.mode, RailMode::NotTrain);
        assert_eq!(rail.decision, RailDecision::UnknownTrip);
    }

    #[test]
    fn test_invalidation_is_persisted_once() {
        let mut points = track();
        points[20].latitude += 0.02; // ~2.2 km off in 8 s
        let store = MemoryStore::new();
        store.insert_points("t1", points).unwrap();
        let analyzer = analyzer(store);

        let first = analyzer.mark_invalid_speed_jumps("t1").unwrap();
        assert_eq!(first.points_marked_invalid, 1);
        assert!(!analyzer.store().get_points("t1").unwrap()[20].is_valid);

        let second = analyzer.mark_invalid_speed_jumps("t1").unwrap();
        assert_eq!(second.points_marked_invalid, 0);
        assert_eq!(second.points_already_invalid, 1);
    }

    #[test]
    fn test_speed_queries() {
        let analyzer = analyzer(seeded_store());
        let speed = analyzer.weighted_average_speed("t1", true).unwrap().unwrap();
        assert!((speed - 45.0).abs() < 0.5);

        assert!(matches!(
            analyzer.percentile_speed_range("t1", true, 150.0),
            Err(AnalysisError::Validation(_))
        ));
        let range = analyzer.percentile_speed_range("t1", true, 90.0).unwrap();
        assert_eq!(range.total_points, 50); // segments, not points
    }

    #[test]
    fn test_simplify_trip_straight_track() {
        let analyzer = analyzer(seeded_store());
        let simplified = analyzer.simplify_trip("t1").unwrap();
        assert_eq!(simplified.len(), 2);
        assert_eq!(simplified[0].timestamp, 1_000_000);
        assert_eq!(simplified[1].timestamp, 1_400_000);
    }

    #[test]
    fn test_overlapping_longer_trip() {
        let store = seeded_store();
        let analyzer = analyzer(store);
        assert!(!analyzer.has_overlapping_longer_trip("t1").unwrap());

        analyzer.store().insert_trip(trip("t2", 1_200_000, 2_000_000)).unwrap();
        assert!(analyzer.has_overlapping_longer_trip("t1").unwrap());
        assert!(!analyzer.has_overlapping_longer_trip("t2").unwrap());
    }

    #[test]
    fn test_analyze_trip_end_to_end() {
        let analyzer = analyzer(seeded_store());
        let analysis = analyzer.analyze_trip("t1").unwrap();

        assert_eq!(analysis.total_points, 51);
        assert_eq!(analysis.invalidation.points_marked_invalid, 0);
        assert_eq!(analysis.rail.mode, RailMode::Nature("TER/RER".to_string()));
        assert!(analysis.rail.mode.is_train());
        assert!(!analysis.has_overlapping_longer_trip);
        assert_eq!(analysis.simplified.len(), 2);
        assert!((analysis.avg_speed_weighted.unwrap() - 45.0).abs() < 0.5);
    }

    #[test]
    fn test_per_call_configs_override_analyzer_config() {
        let mut points = track();
        // Last 8 fixes indoors at 80 m accuracy
        for point in points.iter_mut().skip(43) {
            point.accuracy = 80.0;
        }
        let store = MemoryStore::new();
        store.insert_trip(trip("t1", 1_000_000, 1_400_000)).unwrap();
        store.insert_points("t1", points).unwrap();
        let analyzer = analyzer(store);

        assert!(analyzer.detect_trailing_noise("t1").unwrap().noise_start_timestamp.is_some());
        let lenient = NoiseConfig { max_accuracy: 100.0, gps_jump_distance: 300.0, ..NoiseConfig::default() };
        let trailing = analyzer.detect_trailing_noise_with("t1", &lenient).unwrap();
        assert_eq!(trailing.noise_start_timestamp, None);

        // ~45 km/h is over a 30 km/h cap for every segment
        let capped = SpeedConfig { max_speed_kmh: 30.0, ..SpeedConfig::default() };
        assert_eq!(analyzer.weighted_average_speed_with("t1", true, &capped).unwrap(), None);
        assert!(analyzer.weighted_average_speed("t1", true).unwrap().is_some());

        let strict_rail = RailConfig { min_train_speed: 50.0, ..RailConfig::default() };
        let rail = analyzer.classify_rail_mode_with("t1", &strict_rail).unwrap();
        assert_eq!(rail.decision, RailDecision::TooSlow);
        assert!(!rail.mode.is_train());
        assert!(analyzer.classify_rail_mode("t1").unwrap().mode.is_train());

        // 80 m accuracy is unreliable by default; a looser cap keeps every point
        let loose = InvalidationConfig { max_accuracy: 100.0, ..InvalidationConfig::default() };
        assert_eq!(analyzer.mark_invalid_speed_jumps_with("t1", &loose).unwrap().points_marked_invalid, 0);
        assert_eq!(analyzer.mark_invalid_speed_jumps("t1").unwrap().points_marked_invalid, 8);
    }

    #[test]
    fn test_batch_reports_each_trip() {
        let analyzer = analyzer(seeded_store());
        let results = analyzer.analyze_trips(&["t1", "missing"]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().err(),
            Some(&AnalysisError::NotFound("missing".to_string()))
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batch_matches_sequential() {
        let store = seeded_store();
        store.insert_trip(trip("t2", 5_000_000, 5_400_000)).unwrap();
        store.insert_points("t2", track()).unwrap();
        let analyzer = analyzer(store);

        let ids = vec!["t1".to_string(), "t2".to_string(), "missing".to_string()];
        let parallel = analyzer.analyze_trips_parallel(&ids);
        let sequential = analyzer.analyze_trips(&ids);
        assert_eq!(parallel, sequential);
    }
}
