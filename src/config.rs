//! Validator thresholds and geometry tolerances.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Tunables shared by every validator. Loaded from JSON, with every field
/// optional:
/// ```json
/// {
///   "refresh_interval_secs": 30,
///   "ignore_shapes": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Earliest timestamp accepted as POSIX seconds (E001).
    pub min_posix_time: u64,
    /// Latest timestamp accepted as POSIX seconds (E001).
    pub max_posix_time: u64,
    /// W007
    pub refresh_interval_secs: u64,
    /// W008
    pub stale_feed_secs: u64,
    /// E050
    pub future_tolerance_secs: u64,
    /// W004, meters per second.
    pub max_vehicle_speed_mps: f32,
    /// Margin added around the stop coverage box (E028).
    pub stop_buffer_meters: f64,
    /// Margin around each trip shape (E029).
    pub shape_buffer_meters: f64,
    pub ignore_shapes: bool,
    /// Accepted `gtfs_realtime_version` values (E038).
    pub supported_versions: Vec<String>,
    pub deadline_millis: Option<u64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_posix_time: 1_325_376_000,
            max_posix_time: 4_102_444_800,
            refresh_interval_secs: 35,
            stale_feed_secs: 65,
            future_tolerance_secs: 60,
            max_vehicle_speed_mps: 44.704,
            stop_buffer_meters: 1609.344,
            shape_buffer_meters: 200.0,
            ignore_shapes: false,
            supported_versions: vec!["1.0".to_string(), "2.0".to_string()],
            deadline_millis: None,
        }
    }
}

impl ValidatorConfig {
    /// Loads the config from a JSON file at `path`. Missing fields keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ValidatorConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn is_posix(&self, timestamp: u64) -> bool {
        timestamp >= self.min_posix_time && timestamp <= self.max_posix_time
    }
}
