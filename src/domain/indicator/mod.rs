//! Indicator columns.
//!
//! - `Field`: identity of one output column (its `Display` is the column name)
//! - `IndicatorPoint`: a single dated value with a validity flag
//! - `IndicatorSeries`: a column aligned 1:1 with the bar series
//!
//! Positions inside a warm-up window, or otherwise undefined, have
//! `valid == false` and a stored value of `0.0` that is never read as data.

pub mod rolling;

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    VolumeZscore,
    VolumeAnomaly,
    ConsecutiveAnomalies,
    PriceVolatilityZscore,
    PriceVolumeCorr,
    PumpDumpPattern,
    ShakeoutPattern,
    PriceManipulationScore,
    PriceManipulation,
    BigOrderVolume,
    BigOrderDirection,
    BigOrderNetInflow,
    BigOrderNetInflow5d,
    BigOrderNetInflow10d,
    BigOrderNetInflow20d,
    BigOrderRatio,
    BigOrderConcentration,
    BigOrderAnomaly,
    Mfi14,
    Mfi28,
    Mfi56,
    MfiDivergence,
    FundFlowScore,
    FundFlowAnomaly,
    ManipulationScore,
    ManipulationProbability,
    ManipulationDirection,
}

impl Field {
    /// Every column in export order.
    pub const ALL: [Field; 27] = [
        Field::VolumeZscore,
        Field::VolumeAnomaly,
        Field::ConsecutiveAnomalies,
        Field::PriceVolatilityZscore,
        Field::PriceVolumeCorr,
        Field::PumpDumpPattern,
        Field::ShakeoutPattern,
        Field::PriceManipulationScore,
        Field::PriceManipulation,
        Field::BigOrderVolume,
        Field::BigOrderDirection,
        Field::BigOrderNetInflow,
        Field::BigOrderNetInflow5d,
        Field::BigOrderNetInflow10d,
        Field::BigOrderNetInflow20d,
        Field::BigOrderRatio,
        Field::BigOrderConcentration,
        Field::BigOrderAnomaly,
        Field::Mfi14,
        Field::Mfi28,
        Field::Mfi56,
        Field::MfiDivergence,
        Field::FundFlowScore,
        Field::FundFlowAnomaly,
        Field::ManipulationScore,
        Field::ManipulationProbability,
        Field::ManipulationDirection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::VolumeZscore => "volume_zscore",
            Field::VolumeAnomaly => "volume_anomaly",
            Field::ConsecutiveAnomalies => "consecutive_anomalies",
            Field::PriceVolatilityZscore => "price_volatility_zscore",
            Field::PriceVolumeCorr => "price_volume_corr",
            Field::PumpDumpPattern => "pump_dump_pattern",
            Field::ShakeoutPattern => "shakeout_pattern",
            Field::PriceManipulationScore => "price_manipulation_score",
            Field::PriceManipulation => "price_manipulation",
            Field::BigOrderVolume => "big_order_volume",
            Field::BigOrderDirection => "big_order_direction",
            Field::BigOrderNetInflow => "big_order_net_inflow",
            Field::BigOrderNetInflow5d => "big_order_net_inflow_5d",
            Field::BigOrderNetInflow10d => "big_order_net_inflow_10d",
            Field::BigOrderNetInflow20d => "big_order_net_inflow_20d",
            Field::BigOrderRatio => "big_order_ratio",
            Field::BigOrderConcentration => "big_order_concentration",
            Field::BigOrderAnomaly => "big_order_anomaly",
            Field::Mfi14 => "mfi_14",
            Field::Mfi28 => "mfi_28",
            Field::Mfi56 => "mfi_56",
            Field::MfiDivergence => "mfi_divergence",
            Field::FundFlowScore => "fund_flow_score",
            Field::FundFlowAnomaly => "fund_flow_anomaly",
            Field::ManipulationScore => "manipulation_score",
            Field::ManipulationProbability => "manipulation_probability",
            Field::ManipulationDirection => "manipulation_direction",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub field: Field,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Build a column from per-bar optional values; `None` marks an undefined
    /// position. `values` must have the same length as `bars`.
    pub fn from_options(field: Field, bars: &[OhlcvBar], values: &[Option<f64>]) -> Self {
        debug_assert_eq!(bars.len(), values.len());
        let values = bars
            .iter()
            .zip(values)
            .map(|(bar, v)| IndicatorPoint {
                date: bar.date,
                valid: v.is_some(),
                value: v.unwrap_or(0.0),
            })
            .collect();
        Self { field, values }
    }

    /// Build a column that is defined at every position.
    pub fn from_values(field: Field, bars: &[OhlcvBar], values: &[f64]) -> Self {
        debug_assert_eq!(bars.len(), values.len());
        let values = bars
            .iter()
            .zip(values)
            .map(|(bar, &value)| IndicatorPoint {
                date: bar.date,
                valid: true,
                value,
            })
            .collect();
        Self { field, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `None` when undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .and_then(|p| if p.valid { Some(p.value) } else { None })
    }

    /// Value at `index`, or `fallback` when undefined.
    pub fn get_or(&self, index: usize, fallback: f64) -> f64 {
        self.get(index).unwrap_or(fallback)
    }

    pub fn to_options(&self) -> Vec<Option<f64>> {
        (0..self.values.len()).map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(n: usize) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn field_display_is_column_name() {
        assert_eq!(Field::VolumeZscore.to_string(), "volume_zscore");
        assert_eq!(Field::BigOrderNetInflow5d.to_string(), "big_order_net_inflow_5d");
        assert_eq!(Field::Mfi56.to_string(), "mfi_56");
        assert_eq!(
            Field::ManipulationProbability.to_string(),
            "manipulation_probability"
        );
    }

    #[test]
    fn field_names_are_unique() {
        let names: std::collections::HashSet<_> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn from_options_marks_undefined_positions() {
        let bars = make_bars(3);
        let series = IndicatorSeries::from_options(
            Field::VolumeZscore,
            &bars,
            &[None, Some(1.5), None],
        );
        assert_eq!(series.len(), 3);
        assert!(!series.values[0].valid);
        assert!(series.values[1].valid);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(1.5));
        assert_eq!(series.get(7), None);
        assert_eq!(series.get_or(2, 50.0), 50.0);
        assert_eq!(series.values[2].date, bars[2].date);
    }

    #[test]
    fn to_options_round_trips_validity() {
        let bars = make_bars(2);
        let raw = vec![Some(2.0), None];
        let series = IndicatorSeries::from_options(Field::Mfi14, &bars, &raw);
        assert_eq!(series.to_options(), raw);
    }
}
