//! Ordered set of analyzer stages with dependency resolution.
//!
//! Before a stage runs, every column it requires that the series does not
//! yet carry is produced by running the owning stage first. Stages whose
//! columns already exist are skipped, so running a pipeline twice, or in a
//! different stage order, yields the same series.

use crate::domain::analyzer::big_order::{BigOrderFlowAnalyzer, BigOrderRecord};
use crate::domain::analyzer::fund_flow::FundFlowAnalyzer;
use crate::domain::analyzer::price::PriceManipulationAnalyzer;
use crate::domain::analyzer::scorer::ManipulationScorer;
use crate::domain::analyzer::volume::VolumeAnomalyAnalyzer;
use crate::domain::analyzer::{run_stage, Analyzer, StageOutcome};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::indicator::Field;
use crate::domain::series::AnnotatedSeries;
use tracing::{debug, info, warn};

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl Analyzer + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Volume, price, big-order and fund-flow stages followed by the scorer.
    /// With `big_orders` the big-order stage uses the ingested records instead
    /// of estimating flow from the bars.
    pub fn standard(config: &DetectorConfig, big_orders: Option<&[BigOrderRecord]>) -> Self {
        let big_order = match big_orders {
            Some(records) => BigOrderFlowAnalyzer::with_records(config, records.to_vec()),
            None => BigOrderFlowAnalyzer::new(config),
        };
        Self::new()
            .with_stage(VolumeAnomalyAnalyzer::new(config))
            .with_stage(PriceManipulationAnalyzer::new(config))
            .with_stage(big_order)
            .with_stage(FundFlowAnalyzer::new())
            .with_stage(ManipulationScorer::new(config))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage, dependencies first. Outcomes are in execution order.
    pub fn run(&self, series: &mut AnnotatedSeries) -> Vec<StageOutcome> {
        if series.is_empty() {
            debug!(symbol = %series.symbol, "empty series, no stage run");
            return Vec::new();
        }

        let mut resolver = Resolver {
            done: vec![false; self.stages.len()],
            active: Vec::new(),
            outcomes: Vec::with_capacity(self.stages.len()),
        };
        for idx in 0..self.stages.len() {
            self.ensure(idx, series, &mut resolver);
        }

        let degraded = resolver.outcomes.iter().filter(|o| o.is_degraded()).count();
        info!(
            symbol = %series.symbol,
            bars = series.len(),
            stages = resolver.outcomes.len(),
            degraded,
            "pipeline finished"
        );
        resolver.outcomes
    }

    fn producer_of(&self, field: Field) -> Option<usize> {
        self.stages.iter().position(|s| s.produces().contains(&field))
    }

    fn ensure(&self, idx: usize, series: &mut AnnotatedSeries, resolver: &mut Resolver) {
        if resolver.done[idx] {
            return;
        }
        let stage = self.stages[idx].as_ref();

        if resolver.active.contains(&idx) {
            resolver.done[idx] = true;
            resolver.record(StageOutcome::Degraded {
                stage: stage.name(),
                cause: DetectionError::Computation {
                    stage: stage.name(),
                    reason: "dependency cycle".into(),
                },
            });
            return;
        }

        resolver.active.push(idx);
        for &field in stage.requires() {
            if series.has(field) {
                continue;
            }
            match self.producer_of(field) {
                Some(producer) if producer != idx => self.ensure(producer, series, resolver),
                _ => debug!(stage = stage.name(), %field, "no producer for required field"),
            }
        }
        resolver.active.pop();

        if !resolver.done[idx] {
            resolver.done[idx] = true;
            resolver.record(run_stage(stage, series));
        }
    }
}

struct Resolver {
    done: Vec<bool>,
    active: Vec<usize>,
    outcomes: Vec<StageOutcome>,
}

impl Resolver {
    fn record(&mut self, outcome: StageOutcome) {
        match &outcome {
            StageOutcome::Applied { stage } => debug!(stage, "stage applied"),
            StageOutcome::Skipped { stage } => debug!(stage, "stage skipped, fields present"),
            StageOutcome::Degraded { stage, cause } => warn!(stage, error = %cause, "stage degraded"),
        }
        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorSeries;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn bars(n: usize) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 20.0 + (i % 5) as f64;
                OhlcvBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000.0 + (i % 3) as f64 * 1_500.0,
                }
            })
            .collect()
    }

    struct Needs(&'static str, &'static [Field], &'static [Field]);

    impl Analyzer for Needs {
        fn name(&self) -> &'static str {
            self.0
        }

        fn produces(&self) -> &'static [Field] {
            self.1
        }

        fn requires(&self) -> &'static [Field] {
            self.2
        }

        fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
            Ok(self
                .1
                .iter()
                .map(|f| IndicatorSeries::from_values(*f, &series.bars, &vec![1.0; series.len()]))
                .collect())
        }
    }

    #[test]
    fn standard_pipeline_produces_every_column() {
        let mut series = AnnotatedSeries::new("TEST", bars(80));
        let outcomes = Pipeline::standard(&DetectorConfig::default(), None).run(&mut series);
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| !o.is_degraded()));
        for field in Field::ALL {
            assert!(series.has(field), "missing {field}");
        }
    }

    #[test]
    fn producers_run_before_consumers() {
        let pipeline = Pipeline::new()
            .with_stage(Needs("consumer", &[Field::ManipulationScore], &[Field::Mfi14]))
            .with_stage(Needs("producer", &[Field::Mfi14], &[]));
        let mut series = AnnotatedSeries::new("TEST", bars(3));
        let order: Vec<_> = pipeline.run(&mut series).iter().map(|o| o.stage()).collect();
        assert_eq!(order, vec!["producer", "consumer"]);
    }

    #[test]
    fn second_run_skips_everything() {
        let pipeline = Pipeline::standard(&DetectorConfig::default(), None);
        let mut series = AnnotatedSeries::new("TEST", bars(30));
        pipeline.run(&mut series);
        let snapshot = series.clone();
        let outcomes = pipeline.run(&mut series);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, StageOutcome::Skipped { .. })));
        assert_eq!(series, snapshot);
    }

    #[test]
    fn cycle_degrades_instead_of_recursing() {
        let pipeline = Pipeline::new()
            .with_stage(Needs("a", &[Field::Mfi14], &[Field::Mfi28]))
            .with_stage(Needs("b", &[Field::Mfi28], &[Field::Mfi14]));
        let mut series = AnnotatedSeries::new("TEST", bars(3));
        let outcomes = pipeline.run(&mut series);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|o| o.is_degraded()));
    }

    #[test]
    fn empty_series_runs_nothing() {
        let mut series = AnnotatedSeries::new("TEST", vec![]);
        let outcomes = Pipeline::standard(&DetectorConfig::default(), None).run(&mut series);
        assert!(outcomes.is_empty());
        assert!(series.indicators.is_empty());
    }

    #[test]
    fn stage_names_in_order() {
        assert_eq!(
            Pipeline::standard(&DetectorConfig::default(), None).stage_names(),
            vec![
                "volume_anomaly",
                "price_manipulation",
                "big_order_flow",
                "fund_flow",
                "manipulation_score"
            ]
        );
    }
}
