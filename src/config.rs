//! Tunable analysis thresholds and server settings.

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

use crate::data::TimeSlot;

/// Thresholds used by the advisor and the insight engine.
///
/// The defaults reproduce the heuristics the reports were designed around
/// (a 40-slot week, 60% room utilization, a 30% workload spread, 50% slot
/// usage, a z-score of 2 and a 0.3 conflict-risk cut-off).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// Slots a room could host per week (slots per day times working days).
    pub weekly_capacity_slots: u32,
    /// Rooms below this utilization percentage get a suggestion.
    pub underutilization_pct: f64,
    /// A workload spread above `ratio * mean` hours gets a suggestion.
    pub workload_spread_ratio: f64,
    /// Slot keys used less than `ratio * mean` times get a suggestion.
    pub slot_usage_ratio: f64,
    pub anomaly_z_score: f64,
    pub conflict_risk_threshold: f64,
    /// Mean entries per slot key that maps to a conflict probability of 1.
    pub conflict_risk_divisor: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            weekly_capacity_slots: 40,
            underutilization_pct: 60.0,
            workload_spread_ratio: 0.3,
            slot_usage_ratio: 0.5,
            anomaly_z_score: 2.0,
            conflict_risk_threshold: 0.3,
            conflict_risk_divisor: 10.0,
        }
    }
}

impl AnalysisSettings {
    /// Default thresholds with the weekly capacity taken from a slot grid.
    pub fn for_slots(slots: &[TimeSlot]) -> Self {
        let mut settings = Self::default();
        if !slots.is_empty() {
            settings.weekly_capacity_slots = slots.len() as u32;
        }
        settings
    }
}

/// HTTP server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub const BIND_ADDR_VAR: &'static str = "TIMETABLE_BIND_ADDR";

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(Self::BIND_ADDR_VAR) {
            match raw.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(
                    "Ignoring {}='{}': {}; using {}",
                    Self::BIND_ADDR_VAR,
                    raw,
                    e,
                    config.bind_addr
                ),
            }
        }
        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Day, GenerationConfig};
    use crate::timeslots::generate_time_slots;

    #[test]
    fn test_weekly_capacity_follows_slot_grid() {
        let slots = generate_time_slots(&GenerationConfig::default()).unwrap();
        assert_eq!(AnalysisSettings::for_slots(&slots).weekly_capacity_slots, 40);

        let config = GenerationConfig {
            working_days: vec![Day::Monday, Day::Tuesday],
            ..GenerationConfig::default()
        };
        let slots = generate_time_slots(&config).unwrap();
        assert_eq!(AnalysisSettings::for_slots(&slots).weekly_capacity_slots, 16);
        assert_eq!(AnalysisSettings::for_slots(&[]).weekly_capacity_slots, 40);
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let settings: AnalysisSettings =
            serde_json::from_str(r#"{"underutilizationPct": 75.0}"#).unwrap();
        assert_eq!(settings.underutilization_pct, 75.0);
        assert_eq!(settings.weekly_capacity_slots, 40);
        assert_eq!(settings.anomaly_z_score, 2.0);
    }
}
