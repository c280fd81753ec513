//! Sweep many synthetic trips across the rayon pool.
//!
//! Run with: cargo run --example batch_sweep --features parallel

use std::sync::Arc;
use std::time::Instant;

use trip_analyzer::{
    AnalysisConfig, MemoryStore, RailBufferIndex, Trip, TripAnalyzer, TripPoint, NORMAL_TRIP_TYPE,
};

fn main() {
    let store = Arc::new(MemoryStore::new());
    let mut trip_ids = Vec::new();

    // 500 trips of 200 points each, scattered around Lyon
    for t in 0..500 {
        let id = format!("trip-{}", t);
        let start = 1_700_000_000_000 + t * 3_600_000;
        let base_lat = 45.70 + (t % 50) as f64 * 0.002;
        let base_lng = 4.80 + (t / 50) as f64 * 0.002;

        let points: Vec<TripPoint> = (0..200)
            .map(|i| {
                let wobble = ((i * 7 + t) % 11) as f64 * 0.00001;
                TripPoint::new(start + i * 5_000, base_lat + i as f64 * 0.0003 + wobble, base_lng + wobble)
            })
            .collect();

        store
            .insert_trip(Trip {
                id: id.clone(),
                user_id: format!("user-{}", t % 20),
                start_time: start,
                end_time: start + 995_000,
                total_distance: 6.6,
                avg_speed: 24.0,
                trip_type: NORMAL_TRIP_TYPE.to_string(),
            })
            .expect("insert trip");
        store.insert_points(&id, points).expect("insert points");
        trip_ids.push(id);
    }
    trip_ids.push("missing-trip".to_string());

    let analyzer = TripAnalyzer::new(
        store,
        Arc::new(RailBufferIndex::new(Vec::new())),
        AnalysisConfig::default(),
    );

    println!("Batch Sweep Example\n");

    let started = Instant::now();
    let results = analyzer.analyze_trips_parallel(&trip_ids);
    let elapsed = started.elapsed();

    let ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let failed = results.len() - ok.len();
    let simplified: usize = ok.iter().map(|a| a.simplified.len()).sum();
    let noisy = ok.iter().filter(|a| a.trailing_noise.noise_start_timestamp.is_some()).count();

    println!("Analyzed {} trips in {:?} ({} failed)", ok.len(), elapsed, failed);
    println!("  Average simplified size: {:.1} points", simplified as f64 / ok.len() as f64);
    println!("  Trips with trailing noise: {}", noisy);
}
