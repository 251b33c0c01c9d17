//! Fund flow: multi-period Money Flow Index and divergence.
//!
//! TP = (H + L + C) / 3, MF = TP * V. Positive flow is MF when TP rose from
//! the previous bar, negative flow MF when it fell; both are 0 on the first
//! bar. For each period P:
//!
//! MFI(P) = 100 - 100 / (1 + sum(pos, P) / sum(neg, P))
//!
//! with the ratio fixed at 100 when the negative sum is exactly zero.
//! Warmup: first P-1 bars are invalid.

use crate::domain::analyzer::{check_bars, non_empty, Analyzer};
use crate::domain::error::DetectionError;
use crate::domain::indicator::rolling::{rolling_max, rolling_min, rolling_sum};
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::AnnotatedSeries;

const STAGE: &str = "fund_flow";

const PRODUCES: &[Field] = &[
    Field::Mfi14,
    Field::Mfi28,
    Field::Mfi56,
    Field::MfiDivergence,
    Field::FundFlowScore,
    Field::FundFlowAnomaly,
];

pub const MFI_PERIODS: [usize; 3] = [14, 28, 56];
const DIVERGENCE_LOOKBACK: usize = 14;
/// Flow ratio used when no negative flow occurred in the period.
pub const ALL_POSITIVE_RATIO: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct FundFlowAnalyzer;

impl FundFlowAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

/// (positive, negative) money flow per bar.
pub fn money_flows(bars: &[OhlcvBar]) -> (Vec<f64>, Vec<f64>) {
    let mut positive = Vec::with_capacity(bars.len());
    let mut negative = Vec::with_capacity(bars.len());
    for (t, bar) in bars.iter().enumerate() {
        let tp = bar.typical_price();
        let flow = tp * bar.volume;
        let prev_tp = if t == 0 { tp } else { bars[t - 1].typical_price() };
        positive.push(if tp > prev_tp { flow } else { 0.0 });
        negative.push(if tp < prev_tp { flow } else { 0.0 });
    }
    (positive, negative)
}

pub fn calculate_mfi(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let (positive, negative) = money_flows(bars);
    let pos_sum = rolling_sum(&positive.into_iter().map(Some).collect::<Vec<_>>(), period);
    let neg_sum = rolling_sum(&negative.into_iter().map(Some).collect::<Vec<_>>(), period);

    pos_sum
        .iter()
        .zip(&neg_sum)
        .map(|(pos, neg)| {
            let (pos, neg) = ((*pos)?, (*neg)?);
            let ratio = if neg == 0.0 { ALL_POSITIVE_RATIO } else { pos / neg };
            Some((100.0 - 100.0 / (1.0 + ratio)).clamp(0.0, 100.0))
        })
        .collect()
}

/// -1 when close sets a 14-bar high that MFI(14) does not confirm, +1 when
/// close sets a 14-bar low that MFI(14) does not confirm.
pub fn divergence(closes: &[f64], mfi: &[Option<f64>]) -> Vec<f64> {
    let close_defined: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    let close_high = rolling_max(&close_defined, DIVERGENCE_LOOKBACK);
    let close_low = rolling_min(&close_defined, DIVERGENCE_LOOKBACK);
    let mfi_high = rolling_max(mfi, DIVERGENCE_LOOKBACK);
    let mfi_low = rolling_min(mfi, DIVERGENCE_LOOKBACK);

    (0..closes.len())
        .map(|t| {
            let (Some(m), Some(hi), Some(lo), Some(m_hi), Some(m_lo)) =
                (mfi[t], close_high[t], close_low[t], mfi_high[t], mfi_low[t])
            else {
                return 0.0;
            };
            if closes[t] >= hi && m < m_hi {
                -1.0
            } else if closes[t] <= lo && m > m_lo {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// 0.4 MFI(14) + 0.3 MFI(28) + 0.3 MFI(56)
pub fn fund_flow_score(mfi_14: f64, mfi_28: f64, mfi_56: f64) -> f64 {
    100.0 * (0.4 * mfi_14 / 100.0 + 0.3 * mfi_28 / 100.0 + 0.3 * mfi_56 / 100.0)
}

pub fn classify(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s > 80.0 => 1.0,
        Some(s) if s < 20.0 => -1.0,
        _ => 0.0,
    }
}

impl Analyzer for FundFlowAnalyzer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn produces(&self) -> &'static [Field] {
        PRODUCES
    }

    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
        let bars = non_empty(STAGE, series)?;
        check_bars(STAGE, bars)?;

        let [mfi_14, mfi_28, mfi_56] = MFI_PERIODS.map(|p| calculate_mfi(bars, p));
        let divergence = divergence(&series.closes(), &mfi_14);

        let scores: Vec<Option<f64>> = (0..bars.len())
            .map(|t| Some(fund_flow_score(mfi_14[t]?, mfi_28[t]?, mfi_56[t]?)))
            .collect();
        let anomaly: Vec<f64> = scores.iter().map(|s| classify(*s)).collect();

        Ok(vec![
            IndicatorSeries::from_options(Field::Mfi14, bars, &mfi_14),
            IndicatorSeries::from_options(Field::Mfi28, bars, &mfi_28),
            IndicatorSeries::from_options(Field::Mfi56, bars, &mfi_56),
            IndicatorSeries::from_values(Field::MfiDivergence, bars, &divergence),
            IndicatorSeries::from_options(Field::FundFlowScore, bars, &scores),
            IndicatorSeries::from_values(Field::FundFlowAnomaly, bars, &anomaly),
        ])
    }
}
