//! Volume anomaly detection.
//!
//! logRatio[t] = ln(V[t] / V[t-1]), undefined at t = 0 or when either volume
//! is zero. Z-score over the trailing `window` log ratios (current included,
//! sample standard deviation). Flag +1/-1 beyond +/- `threshold` sigma.
//! Warmup: the first `window` bars have no z-score and are never flagged.

use crate::domain::analyzer::{check_volumes, non_empty, Analyzer};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::indicator::rolling::rolling_zscore;
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::AnnotatedSeries;

const STAGE: &str = "volume_anomaly";

const PRODUCES: &[Field] = &[
    Field::VolumeZscore,
    Field::VolumeAnomaly,
    Field::ConsecutiveAnomalies,
];

#[derive(Debug, Clone)]
pub struct VolumeAnomalyAnalyzer {
    threshold: f64,
    window: usize,
}

impl VolumeAnomalyAnalyzer {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.volume_threshold,
            window: config.volume_window,
        }
    }
}

pub fn log_volume_ratios(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|t| {
            if t == 0 {
                return None;
            }
            let (prev, cur) = (bars[t - 1].volume, bars[t].volume);
            if prev > 0.0 && cur > 0.0 {
                Some((cur / prev).ln())
            } else {
                None
            }
        })
        .collect()
}

/// +1 above `threshold`, -1 below `-threshold`, 0 otherwise or when undefined.
pub fn anomaly_flags(zscores: &[Option<f64>], threshold: f64) -> Vec<f64> {
    zscores
        .iter()
        .map(|z| match z {
            Some(z) if *z > threshold => 1.0,
            Some(z) if *z < -threshold => -1.0,
            _ => 0.0,
        })
        .collect()
}

/// Length of the run of non-zero flags ending at each position.
pub fn run_lengths(flags: &[f64]) -> Vec<f64> {
    flags
        .iter()
        .scan(0.0, |run, &flag| {
            *run = if flag != 0.0 { *run + 1.0 } else { 0.0 };
            Some(*run)
        })
        .collect()
}

impl Analyzer for VolumeAnomalyAnalyzer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn produces(&self) -> &'static [Field] {
        PRODUCES
    }

    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
        let bars = non_empty(STAGE, series)?;
        check_volumes(STAGE, bars)?;

        let zscores = rolling_zscore(&log_volume_ratios(bars), self.window);
        let flags = anomaly_flags(&zscores, self.threshold);
        let runs = run_lengths(&flags);

        Ok(vec![
            IndicatorSeries::from_options(Field::VolumeZscore, bars, &zscores),
            IndicatorSeries::from_values(Field::VolumeAnomaly, bars, &flags),
            IndicatorSeries::from_values(Field::ConsecutiveAnomalies, bars, &runs),
        ])
    }
}
