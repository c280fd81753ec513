//! Persistence interfaces and an in-memory implementation.
//!
//! The engine reads trips and points and writes one thing back: the
//! `is_valid = false` flag produced by invalidation. Anything able to do
//! that by trip id can back a [`TripAnalyzer`](crate::TripAnalyzer).

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::error::{AnalysisError, Result};
use crate::{Trip, TripPoint};

/// Access to a trip's recorded points.
pub trait PointStore: Send + Sync {
    /// All points of a trip, ordered by timestamp. Unknown trips have none.
    fn get_points(&self, trip_id: &str) -> Result<Vec<TripPoint>>;

    /// Flag the points with these timestamps as invalid. One-way: a store
    /// never turns an invalid point valid again.
    fn set_invalid(&self, trip_id: &str, timestamps: &[i64]) -> Result<()>;
}

/// Access to trip summaries.
pub trait TripStore: Send + Sync {
    fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>>;

    /// Every trip recorded by a user, in no particular order.
    fn get_user_trips(&self, user_id: &str) -> Result<Vec<Trip>>;
}

fn poisoned<T>(_: PoisonError<T>) -> AnalysisError {
    AnalysisError::Store("lock poisoned".to_string())
}

/// Thread-safe in-memory store, for tests, demos and small batch jobs.
///
/// # Example
///
/// ```rust
/// use trip_analyzer::{MemoryStore, PointStore, TripPoint};
///
/// let store = MemoryStore::new();
/// store.insert_points("trip-1", vec![
///     TripPoint::new(20_000, 48.8584, 2.3522),
///     TripPoint::new(10_000, 48.8575, 2.3522),
/// ]).unwrap();
///
/// store.set_invalid("trip-1", &[20_000]).unwrap();
/// let points = store.get_points("trip-1").unwrap();
/// assert_eq!(points[0].timestamp, 10_000);
/// assert!(!points[1].is_valid);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    trips: RwLock<HashMap<String, Trip>>,
    points: RwLock<HashMap<String, Vec<TripPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a trip summary.
    pub fn insert_trip(&self, trip: Trip) -> Result<()> {
        self.trips.write().map_err(poisoned)?.insert(trip.id.clone(), trip);
        Ok(())
    }

    /// Insert or replace a trip's points. They are stored sorted by timestamp.
    pub fn insert_points(&self, trip_id: &str, mut points: Vec<TripPoint>) -> Result<()> {
        points.sort_by_key(|p| p.timestamp);
        self.points.write().map_err(poisoned)?.insert(trip_id.to_string(), points);
        Ok(())
    }

    pub fn trip_count(&self) -> Result<usize> {
        Ok(self.trips.read().map_err(poisoned)?.len())
    }
}

impl PointStore for MemoryStore {
    fn get_points(&self, trip_id: &str) -> Result<Vec<TripPoint>> {
        let points = self.points.read().map_err(poisoned)?;
        Ok(points.get(trip_id).cloned().unwrap_or_default())
    }

    fn set_invalid(&self, trip_id: &str, timestamps: &[i64]) -> Result<()> {
        if timestamps.is_empty() {
            return Ok(());
        }
        let targets: HashSet<i64> = timestamps.iter().copied().collect();
        let mut points = self.points.write().map_err(poisoned)?;
        let trip_points = points
            .get_mut(trip_id)
            .ok_or_else(|| AnalysisError::NotFound(trip_id.to_string()))?;
        for point in trip_points.iter_mut().filter(|p| targets.contains(&p.timestamp)) {
            point.is_valid = false;
        }
        Ok(())
    }
}

impl TripStore for MemoryStore {
    fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        Ok(self.trips.read().map_err(poisoned)?.get(trip_id).cloned())
    }

    fn get_user_trips(&self, user_id: &str) -> Result<Vec<Trip>> {
        let trips = self.trips.read().map_err(poisoned)?;
        Ok(trips.values().filter(|t| t.user_id == user_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, user_id: &str) -> Trip {
        Trip {
            id: id.to_string(),
            user_id: user_id.to_string(),
            start_time: 0,
            end_time: 600_000,
            total_distance: 3.0,
            avg_speed: 18.0,
            trip_type: crate::NORMAL_TRIP_TYPE.to_string(),
        }
    }

    #[test]
    fn test_unknown_trip_has_no_points() {
        let store = MemoryStore::new();
        assert!(store.get_points("missing").unwrap().is_empty());
        assert_eq!(store.get_trip("missing").unwrap(), None);
    }

    #[test]
    fn test_set_invalid_is_one_way() {
        let store = MemoryStore::new();
        store
            .insert_points(
                "t",
                vec![
                    TripPoint::new(0, 45.0, 5.0),
                    TripPoint::new(10_000, 45.001, 5.0).with_valid(false),
                    TripPoint::new(20_000, 45.002, 5.0),
                ],
            )
            .unwrap();

        store.set_invalid("t", &[0, 10_000]).unwrap();
        let valid: Vec<bool> = store.get_points("t").unwrap().iter().map(|p| p.is_valid).collect();
        assert_eq!(valid, vec![false, false, true]);
    }

    #[test]
    fn test_set_invalid_unknown_trip() {
        let store = MemoryStore::new();
        assert!(store.set_invalid("missing", &[]).is_ok());
        assert_eq!(
            store.set_invalid("missing", &[1_000]),
            Err(AnalysisError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_user_trips() {
        let store = MemoryStore::new();
        store.insert_trip(trip("a", "alice")).unwrap();
        store.insert_trip(trip("b", "alice")).unwrap();
        store.insert_trip(trip("c", "bob")).unwrap();

        let mut ids: Vec<String> = store.get_user_trips("alice").unwrap().into_iter().map(|t| t.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.trip_count().unwrap(), 3);
    }
}
