//! Composite manipulation score.
//!
//! score = 100 * (0.25 |volume_zscore| + 0.35 price_manipulation_score / 100
//!              + 0.2 |big_order_anomaly| + 0.2 |fund_flow_score - 50| / 50)
//!
//! Undefined inputs contribute nothing: a missing volume z-score counts as 0
//! and a missing fund flow score as the neutral 50.

use crate::domain::analyzer::{non_empty, required, Analyzer};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::indicator::rolling::sign;
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::series::AnnotatedSeries;
use serde::Serialize;
use std::fmt;

const STAGE: &str = "manipulation_score";

const PRODUCES: &[Field] = &[
    Field::ManipulationScore,
    Field::ManipulationProbability,
    Field::ManipulationDirection,
];

const REQUIRES: &[Field] = &[
    Field::VolumeZscore,
    Field::PriceManipulationScore,
    Field::BigOrderAnomaly,
    Field::BigOrderNetInflow5d,
    Field::FundFlowScore,
];

const NEUTRAL_FUND_FLOW: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Probability {
    Low,
    Medium,
    High,
}

impl Probability {
    pub fn classify(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Probability::High
        } else if score > 0.7 * threshold {
            Probability::Medium
        } else {
            Probability::Low
        }
    }

    /// Numeric code stored in the `manipulation_probability` column.
    pub fn code(&self) -> f64 {
        match self {
            Probability::Low => 0.0,
            Probability::Medium => 1.0,
            Probability::High => 2.0,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        match code as i64 {
            0 => Some(Probability::Low),
            1 => Some(Probability::Medium),
            2 => Some(Probability::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Probability::Low => "low",
            Probability::Medium => "medium",
            Probability::High => "high",
        }
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn manipulation_score(
    volume_zscore: f64,
    price_manipulation_score: f64,
    big_order_anomaly: f64,
    fund_flow_score: f64,
) -> f64 {
    100.0
        * (0.25 * volume_zscore.abs()
            + 0.35 * (price_manipulation_score / 100.0)
            + 0.2 * big_order_anomaly.abs()
            + 0.2 * ((fund_flow_score - NEUTRAL_FUND_FLOW).abs() / NEUTRAL_FUND_FLOW))
}

#[derive(Debug, Clone)]
pub struct ManipulationScorer {
    threshold: f64,
    medium: f64,
}

impl ManipulationScorer {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.manipulation_score_threshold,
            medium: config.medium_score_threshold(),
        }
    }
}

impl Analyzer for ManipulationScorer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn produces(&self) -> &'static [Field] {
        PRODUCES
    }

    fn requires(&self) -> &'static [Field] {
        REQUIRES
    }

    fn compute(&self, series: &AnnotatedSeries) -> Result<Vec<IndicatorSeries>, DetectionError> {
        let bars = non_empty(STAGE, series)?;
        let zscore = required(STAGE, series, Field::VolumeZscore)?;
        let price_score = required(STAGE, series, Field::PriceManipulationScore)?;
        let big_order = required(STAGE, series, Field::BigOrderAnomaly)?;
        let inflow_5d = required(STAGE, series, Field::BigOrderNetInflow5d)?;
        let fund_flow = required(STAGE, series, Field::FundFlowScore)?;

        let mut scores = Vec::with_capacity(bars.len());
        let mut tiers = Vec::with_capacity(bars.len());
        let mut directions = Vec::with_capacity(bars.len());

        for t in 0..bars.len() {
            let score = manipulation_score(
                zscore[t].unwrap_or(0.0),
                price_score[t].unwrap_or(0.0),
                big_order[t].unwrap_or(0.0),
                fund_flow[t].unwrap_or(NEUTRAL_FUND_FLOW),
            );
            if !score.is_finite() {
                return Err(DetectionError::Computation {
                    stage: STAGE,
                    reason: format!("non-finite score on {}", bars[t].date),
                });
            }
            let direction = if score > self.medium {
                sign(inflow_5d[t].unwrap_or(0.0))
            } else {
                0.0
            };
            scores.push(score);
            tiers.push(Probability::classify(score, self.threshold).code());
            directions.push(direction);
        }

        Ok(vec![
            IndicatorSeries::from_values(Field::ManipulationScore, bars, &scores),
            IndicatorSeries::from_values(Field::ManipulationProbability, bars, &tiers),
            IndicatorSeries::from_values(Field::ManipulationDirection, bars, &directions),
        ])
    }
}
