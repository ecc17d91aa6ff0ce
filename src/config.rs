//! Device configuration parameters
//!
//! All tunable timings, drain rates, and thresholds for the CesPod
//! controller. Every timer interval the controller arms comes from here,
//! so tests can compress or stretch the timebase without touching logic.

use serde::{Deserialize, Serialize};

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Timers ---
    /// Power-button hold detection window (milliseconds)
    pub power_hold_ms: u64,
    /// Battery depletion tick interval (milliseconds)
    pub battery_drain_interval_ms: u64,
    /// Soft-off intensity ramp tick interval (milliseconds)
    pub soft_off_tick_ms: u64,
    /// Connectivity test window at session start (milliseconds)
    pub connection_test_ms: u64,
    /// Delay between a disconnect and the safe-voltage ramp (milliseconds)
    pub safe_voltage_delay_ms: u64,
    /// Duration of the safe-voltage ramp-down (milliseconds)
    pub safe_voltage_ramp_ms: u64,
    /// Session timebase: milliseconds of session timer per catalogue minute.
    /// The demo build runs one simulated minute per real second (1000);
    /// a real deployment sets 60_000.
    pub session_minute_ms: u64,

    // --- Battery ---
    /// Battery level at first boot (percent)
    pub initial_battery_level: f32,
    /// Level at or below which the battery tier is Low (percent)
    pub low_battery_threshold: f32,
    /// Level at or below which the battery tier is Critical (percent)
    pub critical_battery_threshold: f32,
    /// Base drain per tick while a session runs (percent)
    pub drain_in_session_base: f32,
    /// Additional drain per intensity step while a session runs (percent)
    pub drain_per_intensity: f32,
    /// Drain scale applied to the connection-quality penalty (percent)
    pub drain_connection_penalty: f32,
    /// Drain per tick while paused (percent)
    pub drain_paused: f32,
    /// Drain per tick in any other powered state (percent)
    pub drain_idle: f32,

    // --- Intensity ---
    /// Lowest in-session intensity step
    pub intensity_min: u8,
    /// Highest in-session intensity step
    pub intensity_max: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Timers
            power_hold_ms: 1000,
            battery_drain_interval_ms: 2000,
            soft_off_tick_ms: 1000,
            connection_test_ms: 5000,
            safe_voltage_delay_ms: 5000,
            safe_voltage_ramp_ms: 20_000,
            session_minute_ms: 1000,

            // Battery
            initial_battery_level: 50.0,
            low_battery_threshold: 25.0,
            critical_battery_threshold: 12.0,
            drain_in_session_base: 0.2,
            drain_per_intensity: 0.1,
            drain_connection_penalty: 0.01,
            drain_paused: 0.05,
            drain_idle: 0.1,

            // Intensity
            intensity_min: 1,
            intensity_max: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = DeviceConfig::default();
        assert!(c.power_hold_ms > 0);
        assert!(c.battery_drain_interval_ms > 0);
        assert!(c.low_battery_threshold > c.critical_battery_threshold);
        assert!(c.initial_battery_level > 0.0 && c.initial_battery_level <= 100.0);
        assert!(c.intensity_min >= 1 && c.intensity_min <= c.intensity_max);
        assert!(c.drain_in_session_base > c.drain_idle);
        assert!(c.drain_idle > c.drain_paused);
    }

    #[test]
    fn low_above_critical_invariant() {
        let c = DeviceConfig::default();
        assert!(
            c.low_battery_threshold > c.critical_battery_threshold,
            "low threshold must sit above critical so tiers never invert"
        );
    }

    #[test]
    fn safe_voltage_ramp_outlasts_delay() {
        let c = DeviceConfig::default();
        assert!(c.safe_voltage_ramp_ms > c.safe_voltage_delay_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = DeviceConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: DeviceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.power_hold_ms, c2.power_hold_ms);
        assert!((c.low_battery_threshold - c2.low_battery_threshold).abs() < 0.001);
        assert_eq!(c.intensity_max, c2.intensity_max);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = DeviceConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: DeviceConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.session_minute_ms, c2.session_minute_ms);
        assert!((c.drain_paused - c2.drain_paused).abs() < 0.001);
    }
}
