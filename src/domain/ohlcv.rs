//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// (high - low) / low
    pub fn volatility(&self) -> f64 {
        (self.high - self.low) / self.low
    }

    /// volume * close
    pub fn notional(&self) -> f64 {
        self.volume * self.close
    }
}

/// Check that bar dates are strictly ascending (and therefore unique).
///
/// Returns the first offending date on failure.
pub fn check_ascending(bars: &[OhlcvBar]) -> Result<(), NaiveDate> {
    match bars.windows(2).find(|w| w[1].date <= w[0].date) {
        Some(w) => Err(w[1].date),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn volatility_is_range_over_low() {
        let bar = sample_bar();
        // (110 - 90) / 90
        assert!((bar.volatility() - 20.0 / 90.0).abs() < 1e-12);
    }

    #[test]
    fn notional() {
        let bar = sample_bar();
        assert!((bar.notional() - 5_250_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn check_ascending_accepts_sorted() {
        let mut second = sample_bar();
        second.date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert!(check_ascending(&[sample_bar(), second]).is_ok());
        assert!(check_ascending(&[]).is_ok());
    }

    #[test]
    fn check_ascending_rejects_duplicates() {
        let err = check_ascending(&[sample_bar(), sample_bar()]).unwrap_err();
        assert_eq!(err, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }
}
