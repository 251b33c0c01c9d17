//! Price manipulation detection.
//!
//! Volatility (high-low)/low is z-scored over the trailing `window` bars.
//! Price/volume correlation is the Pearson correlation of close and volume
//! percent changes over the defined pairs in the trailing window (at least
//! three pairs, otherwise undefined and scored as 0).
//!
//! Two chart patterns, each evaluated at bar t:
//! - pump-dump: 5-bar close change > +10%, 5-bar volume change > +50%, and
//!   price turning down while volume still rises. The trailing window must
//!   hold the full 5-bar lookback.
//! - shakeout: close drops more than 5% over [t-5, t-2], rebounds more than
//!   3% over [t-2, t], and volume peaks at t-3 between t-5 and t-1.

use crate::domain::analyzer::{check_bars, non_empty, Analyzer};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::indicator::rolling::{change_over, pct_change, pearson, rolling_zscore};
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::AnnotatedSeries;

const STAGE: &str = "price_manipulation";

const PRODUCES: &[Field] = &[
    Field::PriceVolatilityZscore,
    Field::PriceVolumeCorr,
    Field::PumpDumpPattern,
    Field::ShakeoutPattern,
    Field::PriceManipulationScore,
    Field::PriceManipulation,
];

const PATTERN_LOOKBACK: usize = 5;
const MIN_CORR_PAIRS: usize = 3;
const PUMP_PRICE_GAIN: f64 = 0.10;
const PUMP_VOLUME_GAIN: f64 = 0.50;
const SHAKEOUT_DROP: f64 = -0.05;
const SHAKEOUT_REBOUND: f64 = 0.03;

#[derive(Debug, Clone)]
pub struct PriceManipulationAnalyzer {
    window: usize,
}

impl PriceManipulationAnalyzer {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            window: config.price_manipulation_window,
        }
    }
}

/// Rolling price/volume correlation. `None` when fewer than three pairs
/// exist in the window; `Some(0.0)` when a side has zero variance.
pub fn price_volume_correlation(bars: &[OhlcvBar], window: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let close_pct = pct_change(&closes);
    let volume_pct = pct_change(&volumes);

    (0..bars.len())
        .map(|t| {
            let start = (t + 1).saturating_sub(window);
            let (xs, ys): (Vec<f64>, Vec<f64>) = (start..=t)
                .filter_map(|i| Some((close_pct[i]?, volume_pct[i]?)))
                .unzip();
            if xs.len() < MIN_CORR_PAIRS {
                None
            } else {
                Some(pearson(&xs, &ys).unwrap_or(0.0))
            }
        })
        .collect()
}

pub fn pump_dump_pattern(bars: &[OhlcvBar], window: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let close_change = change_over(&closes, PATTERN_LOOKBACK);
    let volume_change = change_over(&volumes, PATTERN_LOOKBACK);

    (0..bars.len())
        .map(|t| {
            let start = (t + 1).saturating_sub(window);
            if t < start + PATTERN_LOOKBACK {
                return 0.0;
            }
            let run_up = matches!(close_change[t], Some(c) if c > PUMP_PRICE_GAIN);
            let volume_surge = matches!(volume_change[t], Some(v) if v > PUMP_VOLUME_GAIN);
            let turning = closes[t] < closes[t - 1] && volumes[t] > volumes[t - 1];
            if run_up && volume_surge && turning { 1.0 } else { 0.0 }
        })
        .collect()
}

pub fn shakeout_pattern(bars: &[OhlcvBar]) -> Vec<f64> {
    (0..bars.len())
        .map(|t| {
            if t < PATTERN_LOOKBACK {
                return 0.0;
            }
            let close = |k: usize| bars[t - k].close;
            let volume = |k: usize| bars[t - k].volume;
            let drop = close(2) / close(5) - 1.0;
            let rebound = close(0) / close(2) - 1.0;
            let volume_peak = volume(5) < volume(3) && volume(3) > volume(1);
            if drop < SHAKEOUT_DROP && rebound > SHAKEOUT_REBOUND && volume_peak {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// 100 * (0.3|z| + 0.3|corr| + 0.2 pump_dump + 0.2 shakeout)
pub fn price_manipulation_score(zscore: f64, corr: f64, pump_dump: f64, shakeout: f64) -> f64 {
    100.0 * (0.3 * zscore.abs() + 0.3 * corr.abs() + 0.2 * pump_dump + 0.2 * shakeout)
}

/// 1 (strong) above 70, 0.5 (moderate) above 50, else 0.
pub fn classify(score: f64) -> f64 {
    if score > 70.0 {
        1.0
    } else if score > 50.0 {
        0.5
    } else {
        0.0
    }
}

impl Analyzer for PriceManipulationAnalyzer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn produces(&self) -> &'static [Field] {
        PRODUCES
    }

    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
        let bars = non_empty(STAGE, series)?;
        check_bars(STAGE, bars)?;

        let volatility: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volatility())).collect();
        let zscores = rolling_zscore(&volatility, self.window);
        let corr = price_volume_correlation(bars, self.window);
        let pump_dump = pump_dump_pattern(bars, self.window);
        let shakeout = shakeout_pattern(bars);

        let scores: Vec<f64> = (0..bars.len())
            .map(|t| {
                price_manipulation_score(
                    zscores[t].unwrap_or(0.0),
                    corr[t].unwrap_or(0.0),
                    pump_dump[t],
                    shakeout[t],
                )
            })
            .collect();
        let classes: Vec<f64> = scores.iter().map(|s| classify(*s)).collect();

        Ok(vec![
            IndicatorSeries::from_options(Field::PriceVolatilityZscore, bars, &zscores),
            IndicatorSeries::from_options(Field::PriceVolumeCorr, bars, &corr),
            IndicatorSeries::from_values(Field::PumpDumpPattern, bars, &pump_dump),
            IndicatorSeries::from_values(Field::ShakeoutPattern, bars, &shakeout),
            IndicatorSeries::from_values(Field::PriceManipulationScore, bars, &scores),
            IndicatorSeries::from_values(Field::PriceManipulation, bars, &classes),
        ])
    }
}
