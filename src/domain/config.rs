//! Detector thresholds.
//!
//! Set once at construction and never mutated; every analyzer borrows it.

use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "detector";

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Sigma multiplier for volume log-ratio z-scores.
    pub volume_threshold: f64,
    /// Rolling window for volume statistics (bars).
    pub volume_window: usize,
    /// Rolling window for volatility statistics and price patterns (bars).
    pub price_manipulation_window: usize,
    /// Minimum notional value of a big order.
    pub big_order_threshold: f64,
    pub concentration_threshold: f64,
    /// Score (0-100) above which manipulation probability is high.
    pub manipulation_score_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            volume_threshold: 3.0,
            volume_window: 20,
            price_manipulation_window: 20,
            big_order_threshold: 1_000_000.0,
            concentration_threshold: 0.6,
            manipulation_score_threshold: 70.0,
        }
    }
}

impl DetectorConfig {
    /// Read the `[detector]` section, falling back to defaults for absent keys.
    pub fn from_port(config: &dyn ConfigPort) -> Self {
        let d = Self::default();
        Self {
            volume_threshold: config.get_double(SECTION, "volume_threshold", d.volume_threshold),
            volume_window: config.get_int(SECTION, "volume_window", d.volume_window as i64).max(0)
                as usize,
            price_manipulation_window: config
                .get_int(
                    SECTION,
                    "price_manipulation_window",
                    d.price_manipulation_window as i64,
                )
                .max(0) as usize,
            big_order_threshold: config.get_double(
                SECTION,
                "big_order_threshold",
                d.big_order_threshold,
            ),
            concentration_threshold: config.get_double(
                SECTION,
                "concentration_threshold",
                d.concentration_threshold,
            ),
            manipulation_score_threshold: config.get_double(
                SECTION,
                "manipulation_score_threshold",
                d.manipulation_score_threshold,
            ),
        }
    }

    /// Score above which a signal counts as at least medium probability.
    pub fn medium_score_threshold(&self) -> f64 {
        0.7 * self.manipulation_score_threshold
    }
}
