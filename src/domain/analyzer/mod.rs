//! Detection stages.
//!
//! Each analyzer declares the columns it produces and the columns it reads
//! from earlier stages. [`run_stage`] applies one analyzer to a series and
//! reports an explicit [`StageOutcome`]; a failing stage never modifies the
//! series.

pub mod big_order;
pub mod fund_flow;
pub mod price;
pub mod scorer;
pub mod volume;

use crate::domain::error::DetectionError;
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::AnnotatedSeries;

pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Columns written by this stage.
    fn produces(&self) -> &'static [Field];

    /// Columns this stage reads from other stages.
    fn requires(&self) -> &'static [Field] {
        &[]
    }

    /// Compute every produced column. Must not assume anything about columns
    /// outside `requires()`.
    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage ran and wrote its columns.
    Applied { stage: &'static str },
    /// Every produced column was already present; nothing ran.
    Skipped { stage: &'static str },
    /// The stage failed; the series is exactly as it was before.
    Degraded {
        stage: &'static str,
        cause: DetectionError,
    },
}

impl StageOutcome {
    pub fn stage(&self) -> &'static str {
        match self {
            StageOutcome::Applied { stage }
            | StageOutcome::Skipped { stage }
            | StageOutcome::Degraded { stage, .. } => stage,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded { .. })
    }
}

/// Apply one analyzer. Idempotent: a stage whose columns all exist is skipped.
pub fn run_stage(analyzer: &dyn Analyzer, series: &mut AnnotatedSeries) -> StageOutcome {
    let stage = analyzer.name();
    if analyzer.produces().iter().all(|f| series.has(*f)) {
        return StageOutcome::Skipped { stage };
    }

    let columns = match analyzer.compute(series).and_then(|c| check_columns(stage, series, c)) {
        Ok(columns) => columns,
        Err(cause) => return StageOutcome::Degraded { stage, cause },
    };

    for column in columns {
        series.insert(column);
    }
    StageOutcome::Applied { stage }
}

fn check_columns(
    stage: &'static str,
    series: &AnnotatedSeries,
    columns: Vec<IndicatorSeries>,
) -> Result<Vec<IndicatorSeries>, DetectionError> {
    if let Some(bad) = columns.iter().find(|c| c.len() != series.len()) {
        return Err(DetectionError::Computation {
            stage,
            reason: format!(
                "column {} has {} values for {} bars",
                bad.field,
                bad.len(),
                series.len()
            ),
        });
    }
    Ok(columns)
}

/// Bars of a series, or an input error when there are none.
pub(crate) fn non_empty<'a>(
    stage: &'static str,
    series: &'a AnnotatedSeries,
) -> Result<&'a [OhlcvBar], DetectionError> {
    if series.is_empty() {
        return Err(DetectionError::Input {
            stage,
            reason: "empty series".into(),
        });
    }
    Ok(&series.bars)
}

/// Reject non-finite or negative volumes.
pub(crate) fn check_volumes(stage: &'static str, bars: &[OhlcvBar]) -> Result<(), DetectionError> {
    match bars.iter().find(|b| !b.volume.is_finite() || b.volume < 0.0) {
        Some(bar) => Err(DetectionError::Computation {
            stage,
            reason: format!("invalid volume {} on {}", bar.volume, bar.date),
        }),
        None => Ok(()),
    }
}

/// Reject invalid volumes and non-finite or non-positive prices.
pub(crate) fn check_bars(stage: &'static str, bars: &[OhlcvBar]) -> Result<(), DetectionError> {
    check_volumes(stage, bars)?;
    let bad = bars.iter().find(|b| {
        [b.open, b.high, b.low, b.close]
            .iter()
            .any(|p| !p.is_finite() || *p <= 0.0)
    });
    match bad {
        Some(bar) => Err(DetectionError::Computation {
            stage,
            reason: format!("non-positive or non-finite price on {}", bar.date),
        }),
        None => Ok(()),
    }
}

/// Read a required column as optional values.
pub(crate) fn required(
    stage: &'static str,
    series: &AnnotatedSeries,
    field: Field,
) -> Result<Vec<Option<f64>>, DetectionError> {
    series
        .column(field)
        .map(|c| c.to_options())
        .ok_or(DetectionError::MissingField { stage, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Constant;

    impl Analyzer for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn produces(&self) -> &'static [Field] {
            &[Field::VolumeZscore]
        }

        fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
            let bars = non_empty(self.name(), series)?;
            Ok(vec![IndicatorSeries::from_values(
                Field::VolumeZscore,
                bars,
                &vec![1.0; bars.len()],
            )])
        }
    }

    struct Misaligned;

    impl Analyzer for Misaligned {
        fn name(&self) -> &'static str {
            "misaligned"
        }

        fn produces(&self) -> &'static [Field] {
            &[Field::Mfi14]
        }

        fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
            Ok(vec![IndicatorSeries::from_values(
                Field::Mfi14,
                &series.bars[..1],
                &[1.0],
            )])
        }
    }

    fn series(n: usize) -> AnnotatedSeries {
        let bars = (0..n)
            .map(|i| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0,
                volume: 100.0,
            })
            .collect();
        AnnotatedSeries::new("TEST", bars)
    }

    #[test]
    fn run_stage_applies_then_skips() {
        let mut s = series(3);
        assert_eq!(
            run_stage(&Constant, &mut s),
            StageOutcome::Applied { stage: "constant" }
        );
        assert_eq!(
            run_stage(&Constant, &mut s),
            StageOutcome::Skipped { stage: "constant" }
        );
    }

    #[test]
    fn empty_series_degrades_unchanged() {
        let mut s = series(0);
        let before = s.clone();
        let outcome = run_stage(&Constant, &mut s);
        assert!(outcome.is_degraded());
        assert_eq!(s, before);
    }

    #[test]
    fn misaligned_column_is_rejected() {
        let mut s = series(3);
        let outcome = run_stage(&Misaligned, &mut s);
        match outcome {
            StageOutcome::Degraded { cause, .. } => {
                assert!(matches!(cause, DetectionError::Computation { .. }))
            }
            other => panic!("expected degraded, got {other:?}"),
        }
        assert!(!s.has(Field::Mfi14));
    }

    #[test]
    fn check_bars_rejects_negative_volume() {
        let mut s = series(2);
        s.bars[1].volume = -5.0;
        assert!(check_bars("t", &s.bars).is_err());
    }

    #[test]
    fn check_bars_rejects_zero_low() {
        let mut s = series(2);
        s.bars[0].low = 0.0;
        assert!(check_bars("t", &s.bars).is_err());
    }

    #[test]
    fn required_reports_missing_field() {
        let s = series(2);
        let err = required("scorer", &s, Field::FundFlowScore).unwrap_err();
        assert_eq!(
            err,
            DetectionError::MissingField {
                stage: "scorer",
                field: Field::FundFlowScore
            }
        );
    }
}
