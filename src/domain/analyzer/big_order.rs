//! Big order flow.
//!
//! Two modes:
//! - estimated: a bar is a big order when its volume exceeds twice the
//!   trailing 20-bar mean volume (current bar included) and its notional
//!   exceeds `big_order_threshold`. Direction is the sign of the close change.
//! - ingested: external big-order records are aggregated per date (summed
//!   volume, mean direction) and left-joined onto the bars; dates without
//!   records contribute nothing.
//!
//! Net inflow is volume * close * direction. Both modes then derive rolling
//! 5/10/20-bar net inflow, the per-bar share of notional carried by big
//! orders, its 5-bar mean (concentration) and the anomaly flag.

use crate::domain::analyzer::{check_bars, non_empty, Analyzer};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::indicator::rolling::{rolling_mean, rolling_sum, sign};
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::AnnotatedSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const STAGE: &str = "big_order_flow";

const PRODUCES: &[Field] = &[
    Field::BigOrderVolume,
    Field::BigOrderDirection,
    Field::BigOrderNetInflow,
    Field::BigOrderNetInflow5d,
    Field::BigOrderNetInflow10d,
    Field::BigOrderNetInflow20d,
    Field::BigOrderRatio,
    Field::BigOrderConcentration,
    Field::BigOrderAnomaly,
];

const AVERAGE_VOLUME_WINDOW: usize = 20;
const VOLUME_MULTIPLE: f64 = 2.0;
const CONCENTRATION_WINDOW: usize = 5;

/// One observed large trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigOrderRecord {
    pub date: NaiveDate,
    pub volume: f64,
    /// Buy positive, sell negative.
    pub direction: f64,
}

/// Aggregated flow for one date: summed volume and mean direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyFlow {
    pub volume: f64,
    pub direction: f64,
}

pub fn aggregate_by_date(records: &[BigOrderRecord]) -> BTreeMap<NaiveDate, DailyFlow> {
    let mut acc: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = acc.entry(r.date).or_insert((0.0, 0.0, 0));
        entry.0 += r.volume;
        entry.1 += r.direction;
        entry.2 += 1;
    }
    acc.into_iter()
        .map(|(date, (volume, direction_sum, n))| {
            (
                date,
                DailyFlow {
                    volume,
                    direction: direction_sum / n as f64,
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BigOrderFlowAnalyzer {
    big_order_threshold: f64,
    concentration_threshold: f64,
    records: Option<Vec<BigOrderRecord>>,
}

impl BigOrderFlowAnalyzer {
    /// Estimated mode.
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            big_order_threshold: config.big_order_threshold,
            concentration_threshold: config.concentration_threshold,
            records: None,
        }
    }

    /// Ingested mode.
    pub fn with_records(config: &DetectorConfig, records: Vec<BigOrderRecord>) -> Self {
        Self {
            records: Some(records),
            ..Self::new(config)
        }
    }

    /// Per-bar (volume, direction) of big orders.
    fn flows(&self, bars: &[OhlcvBar]) -> Result<Vec<DailyFlow>, DetectionError> {
        match &self.records {
            Some(records) => ingested_flows(bars, records),
            None => Ok(estimated_flows(bars, self.big_order_threshold)),
        }
    }
}

pub fn estimated_flows(bars: &[OhlcvBar], big_order_threshold: f64) -> Vec<DailyFlow> {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume)).collect();
    let average = rolling_mean(&volumes, AVERAGE_VOLUME_WINDOW);

    bars.iter()
        .enumerate()
        .map(|(t, bar)| {
            let is_big = matches!(average[t], Some(avg) if bar.volume > VOLUME_MULTIPLE * avg)
                && bar.notional() > big_order_threshold;
            if !is_big {
                return DailyFlow {
                    volume: 0.0,
                    direction: 0.0,
                };
            }
            let direction = if t == 0 {
                0.0
            } else {
                sign(bar.close - bars[t - 1].close)
            };
            DailyFlow {
                volume: bar.volume,
                direction,
            }
        })
        .collect()
}

pub fn ingested_flows(
    bars: &[OhlcvBar],
    records: &[BigOrderRecord],
) -> Result<Vec<DailyFlow>, DetectionError> {
    if let Some(bad) = records
        .iter()
        .find(|r| !r.volume.is_finite() || r.volume < 0.0 || !r.direction.is_finite())
    {
        return Err(DetectionError::Computation {
            stage: STAGE,
            reason: format!("malformed big order record on {}", bad.date),
        });
    }

    let daily = aggregate_by_date(records);
    let unmatched = daily
        .keys()
        .filter(|d| bars.binary_search_by_key(*d, |b| b.date).is_err())
        .count();
    if unmatched > 0 {
        debug!(unmatched, "big order records on dates without a bar ignored");
    }

    Ok(bars
        .iter()
        .map(|bar| {
            daily.get(&bar.date).copied().unwrap_or(DailyFlow {
                volume: 0.0,
                direction: 0.0,
            })
        })
        .collect())
}

/// +1 / -1 when concentration exceeds the threshold and the 5-bar net inflow
/// is positive / negative; 0 otherwise or when either input is undefined.
pub fn anomaly_flag(concentration: Option<f64>, inflow_5d: Option<f64>, threshold: f64) -> f64 {
    match (concentration, inflow_5d) {
        (Some(c), Some(net)) if c > threshold => sign(net),
        _ => 0.0,
    }
}

impl Analyzer for BigOrderFlowAnalyzer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn produces(&self) -> &'static [Field] {
        PRODUCES
    }

    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
        let bars = non_empty(STAGE, series)?;
        check_bars(STAGE, bars)?;

        let flows = self.flows(bars)?;
        let volume: Vec<f64> = flows.iter().map(|f| f.volume).collect();
        let direction: Vec<f64> = flows.iter().map(|f| f.direction).collect();
        let net: Vec<f64> = bars
            .iter()
            .zip(&flows)
            .map(|(bar, f)| f.volume * bar.close * f.direction)
            .collect();

        let net_defined: Vec<Option<f64>> = net.iter().copied().map(Some).collect();
        let net_5d = rolling_sum(&net_defined, 5);
        let net_10d = rolling_sum(&net_defined, 10);
        let net_20d = rolling_sum(&net_defined, 20);

        let ratio: Vec<f64> = bars
            .iter()
            .zip(&net)
            .map(|(bar, n)| {
                let notional = bar.notional();
                if notional == 0.0 { 0.0 } else { n.abs() / notional }
            })
            .collect();
        let ratio_defined: Vec<Option<f64>> = ratio.iter().copied().map(Some).collect();
        let concentration = rolling_mean(&ratio_defined, CONCENTRATION_WINDOW);

        let anomaly: Vec<f64> = (0..bars.len())
            .map(|t| anomaly_flag(concentration[t], net_5d[t], self.concentration_threshold))
            .collect();

        Ok(vec![
            IndicatorSeries::from_values(Field::BigOrderVolume, bars, &volume),
            IndicatorSeries::from_values(Field::BigOrderDirection, bars, &direction),
            IndicatorSeries::from_values(Field::BigOrderNetInflow, bars, &net),
            IndicatorSeries::from_options(Field::BigOrderNetInflow5d, bars, &net_5d),
            IndicatorSeries::from_options(Field::BigOrderNetInflow10d, bars, &net_10d),
            IndicatorSeries::from_options(Field::BigOrderNetInflow20d, bars, &net_20d),
            IndicatorSeries::from_values(Field::BigOrderRatio, bars, &ratio),
            IndicatorSeries::from_options(Field::BigOrderConcentration, bars, &concentration),
            IndicatorSeries::from_values(Field::BigOrderAnomaly, bars, &anomaly),
        ])
    }
}
