//! Run the analysis pipeline on one synthetic commuter-rail trip.
//!
//! Run with: cargo run --example trip_pipeline

use std::sync::Arc;

use geo::{LineString, Polygon};
use trip_analyzer::{
    simplify_trajectory, AnalysisConfig, MemoryStore, RailBuffer, RailBufferIndex, Trip,
    TripAnalyzer, TripPoint, NORMAL_TRIP_TYPE, UNKNOWN_HEADING,
};

fn main() {
    // 5 km north out of Paris at ~45 km/h, one fix every 8 s
    let mut points: Vec<TripPoint> = (0..=50)
        .map(|i| TripPoint::new(1_700_000_000_000 + i * 8_000, 48.80 + i as f64 * 0.0009, 2.35))
        .collect();

    // A multipath spike, then a trace that degrades inside the station
    points[17].latitude += 0.02;
    for point in points.iter_mut().skip(46) {
        point.accuracy = 120.0;
        point.heading = UNKNOWN_HEADING;
    }

    let trip = Trip {
        id: "trip-42".to_string(),
        user_id: "user-7".to_string(),
        start_time: 1_700_000_000_000,
        end_time: 1_700_000_400_000,
        total_distance: 5.0,
        avg_speed: 45.0,
        trip_type: NORMAL_TRIP_TYPE.to_string(),
    };

    let store = Arc::new(MemoryStore::new());
    store.insert_trip(trip).expect("insert trip");
    store.insert_points("trip-42", points.clone()).expect("insert points");

    // Commuter line buffer along the first 4.5 km
    let (w, e, s, n) = (2.3498, 2.3502, 48.7995, 48.8406);
    let buffer = Polygon::new(
        LineString::from(vec![(w, s), (e, s), (e, n), (w, n), (w, s)]),
        vec![],
    );
    let rail = Arc::new(RailBufferIndex::new(vec![RailBuffer::new(1, "TER/RER", buffer)]));
    let buffer_count = rail.len();

    let analyzer = TripAnalyzer::new(store, rail, AnalysisConfig::default());

    println!("Trip Pipeline Example\n");

    let noise = analyzer.analyze_noise("trip-42").expect("noise");
    println!("1. Noise: {}/{} points ({:.0}%)", noise.noise_points, noise.total_points, noise.noise_ratio() * 100.0);
    for (tag, count) in &noise.tag_counts {
        println!("   {}: {}", tag, count);
    }

    let trailing = analyzer.detect_trailing_noise("trip-42").expect("trailing noise");
    match trailing.noise_start_timestamp {
        Some(ts) => println!(
            "   Trace degrades at t={} ms ({} of the last {} points noisy)\n",
            ts, trailing.noise_points_from_start, trailing.total_points_from_start
        ),
        None => println!("   No trailing noise\n"),
    }

    let analysis = analyzer.analyze_trip("trip-42").expect("analysis");
    println!(
        "2. Invalidation: {} marked, {} valid",
        analysis.invalidation.points_marked_invalid, analysis.invalidation.points_valid
    );

    match analysis.avg_speed_weighted {
        Some(speed) => println!("3. Weighted speed: {:.1} km/h", speed),
        None => println!("3. Weighted speed: not measurable"),
    }
    let range = analyzer.percentile_speed_range("trip-42", true, 90.0).expect("speed range");
    if let (Some(min), Some(max)) = (range.min_speed, range.max_speed) {
        println!("   Central 90%: {:.1} - {:.1} km/h", min, max);
    }

    println!(
        "4. Simplified: {} -> {} points",
        analysis.total_points,
        analysis.simplified.len()
    );
    println!(
        "   High quality at 1 m: {} points",
        simplify_trajectory(&points, 1.0, true).len()
    );

    println!(
        "5. Rail mode: {} ({:?}, {:.0} m consecutive in buffer)",
        analysis.rail.mode, analysis.rail.decision, analysis.rail.consecutive_train_length
    );
    if analysis.rail.mode.is_train() {
        println!("   Matched against {} of {} rail buffers", analysis.rail.candidate_buffers, buffer_count);
    }
    println!("6. Shorter duplicate: {}", analysis.has_overlapping_longer_trip);
}
