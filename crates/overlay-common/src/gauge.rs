//! Status and trend classification for river gauge readings.
//!
//! Stations report a current water level alongside their normal and maximum
//! (bank-full) levels. Classification is a fixed-threshold comparison; the
//! thresholds are configuration because the overview and the station detail
//! views use different cut-offs.

use serde::{Deserialize, Serialize};

/// Alert status of a gauge reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeStatus {
    High,
    Normal,
    Low,
}

/// Direction of change between two consecutive readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Classification cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeThresholds {
    /// Reading is high at or above `max_level * high_fraction_of_max`.
    pub high_fraction_of_max: f64,
    /// Reading is low at or below `normal_level * low_fraction_of_normal`.
    pub low_fraction_of_normal: f64,
    /// Changes smaller than this (metres) count as stable.
    pub trend_tolerance: f64,
}

impl Default for GaugeThresholds {
    fn default() -> Self {
        Self {
            high_fraction_of_max: 0.8,
            low_fraction_of_normal: 0.7,
            trend_tolerance: 0.05,
        }
    }
}

impl GaugeThresholds {
    /// Stricter cut-offs used on the per-station detail view.
    pub fn detail_page() -> Self {
        Self {
            high_fraction_of_max: 0.9,
            low_fraction_of_normal: 0.3,
            trend_tolerance: 0.05,
        }
    }
}

/// Classify a reading against the station's normal and maximum levels.
pub fn classify_status(
    current: f64,
    normal_level: f64,
    max_level: f64,
    thresholds: &GaugeThresholds,
) -> GaugeStatus {
    if current >= max_level * thresholds.high_fraction_of_max {
        GaugeStatus::High
    } else if current <= normal_level * thresholds.low_fraction_of_normal {
        GaugeStatus::Low
    } else {
        GaugeStatus::Normal
    }
}

/// Classify the change from `previous` to `current`.
pub fn classify_trend(current: f64, previous: f64, thresholds: &GaugeThresholds) -> Trend {
    let diff = current - previous;
    if diff.abs() < thresholds.trend_tolerance {
        Trend::Stable
    } else if diff > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

/// Fraction of the channel filled, clamped to `[0, 1]`.
pub fn fill_fraction(current: f64, max_level: f64) -> f64 {
    if max_level <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / max_level).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_overview_thresholds() {
        let t = GaugeThresholds::default();
        assert_eq!(classify_status(8.0, 5.0, 10.0, &t), GaugeStatus::High);
        assert_eq!(classify_status(3.5, 5.0, 10.0, &t), GaugeStatus::Low);
        assert_eq!(classify_status(5.0, 5.0, 10.0, &t), GaugeStatus::Normal);
    }

    #[test]
    fn test_status_detail_thresholds() {
        let t = GaugeThresholds::detail_page();
        assert_eq!(classify_status(8.0, 5.0, 10.0, &t), GaugeStatus::Normal);
        assert_eq!(classify_status(9.0, 5.0, 10.0, &t), GaugeStatus::High);
        assert_eq!(classify_status(1.5, 5.0, 10.0, &t), GaugeStatus::Low);
    }

    #[test]
    fn test_trend() {
        let t = GaugeThresholds::default();
        assert_eq!(classify_trend(2.00, 2.03, &t), Trend::Stable);
        assert_eq!(classify_trend(2.10, 2.00, &t), Trend::Up);
        assert_eq!(classify_trend(1.90, 2.00, &t), Trend::Down);
    }

    #[test]
    fn test_fill_fraction() {
        assert_eq!(fill_fraction(5.0, 10.0), 0.5);
        assert_eq!(fill_fraction(15.0, 10.0), 1.0);
        assert_eq!(fill_fraction(-1.0, 10.0), 0.0);
        assert_eq!(fill_fraction(5.0, 0.0), 0.0);
    }
}
