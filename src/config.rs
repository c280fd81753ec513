//! Consolidated analysis configuration.
//!
//! Every threshold used by the engine lives in one of the component
//! configuration structs, each defined next to the code that reads it.
//! [`AnalysisConfig`] bundles them so a caller can load a single document.
//!
//! All structs use `#[serde(default)]`, so a partial document only overrides
//! the fields it names:
//!
//! ```rust
//! use trip_analyzer::AnalysisConfig;
//!
//! let config: AnalysisConfig = serde_json::from_str(
//!     r#"{ "noise": { "gps_jump_distance": 300.0 } }"#,
//! ).unwrap();
//! assert_eq!(config.noise.gps_jump_distance, 300.0);
//! assert_eq!(config.rail.distance_to_train, 80.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::{InvalidationConfig, NoiseConfig, RailConfig, SimplifyConfig, SpeedConfig};

/// Configuration for the full per-trip pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub noise: NoiseConfig,
    pub invalidation: InvalidationConfig,
    pub speed: SpeedConfig,
    pub simplify: SimplifyConfig,
    pub rail: RailConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.noise.max_accuracy, 50.0);
        assert_eq!(config.noise.noise_threshold, 0.5);
        assert_eq!(config.invalidation.max_speed_kmh, 1500.0);
        assert_eq!(config.simplify.tolerance_meters, 10.0);
        assert_eq!(config.rail.min_train_ratio, 0.5);
        assert_eq!(config.rail.min_metro_length_ratio, 0.18);
    }

    #[test]
    fn test_json_round_trip_keeps_overrides() {
        let mut config = AnalysisConfig::default();
        config.speed.max_speed_kmh = 250.0;
        config.simplify.high_quality = true;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_document_is_default() {
        let parsed: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AnalysisConfig::default());
    }
}
