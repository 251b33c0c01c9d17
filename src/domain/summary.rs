//! Decision summary for the latest bar of a scored series.

use crate::domain::analyzer::scorer::Probability;
use crate::domain::error::DetectionError;
use crate::domain::indicator::Field;
use crate::domain::series::AnnotatedSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

const STAGE: &str = "summary";
const TREND_ROWS: usize = 5;
const TREND_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Direction::Bullish
        } else if value < 0.0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl ScoreTrend {
    /// Mean day-over-day change of the last five scores, +/-1 thresholds.
    pub fn from_scores(scores: &[f64]) -> Self {
        let tail = &scores[scores.len().saturating_sub(TREND_ROWS)..];
        if tail.len() < 2 {
            return ScoreTrend::Stable;
        }
        let mean_delta =
            tail.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (tail.len() - 1) as f64;
        if mean_delta > TREND_THRESHOLD {
            ScoreTrend::Increasing
        } else if mean_delta < -TREND_THRESHOLD {
            ScoreTrend::Decreasing
        } else {
            ScoreTrend::Stable
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        })
    }
}

impl fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScoreTrend::Increasing => "increasing",
            ScoreTrend::Decreasing => "decreasing",
            ScoreTrend::Stable => "stable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub symbol: String,
    pub date: NaiveDate,
    pub latest_score: f64,
    pub probability: Probability,
    pub direction: Direction,
    pub score_trend: ScoreTrend,
    pub volume_anomaly: bool,
    pub price_manipulation: bool,
    pub big_order_anomaly: bool,
    pub fund_flow_anomaly: bool,
    pub recommendation: &'static str,
}

pub fn recommendation(probability: Probability, direction: Direction) -> &'static str {
    match (probability, direction) {
        (Probability::High, Direction::Bullish) => "follow: likely markup, consider entry",
        (Probability::High, Direction::Bearish) => {
            "caution: likely distribution, consider reducing or holding off"
        }
        (Probability::High, Direction::Neutral) => {
            "alert: strong manipulation signal without clear direction, stay on the sidelines"
        }
        (Probability::Medium, Direction::Bullish) => {
            "watch: possible accumulation, consider a small starter position"
        }
        (Probability::Medium, Direction::Bearish) => "watch: possible distribution, tighten risk",
        (Probability::Medium, Direction::Neutral) => {
            "watch: unusual activity without clear direction, wait for confirmation"
        }
        (Probability::Low, _) => "no significant signal, decide independently",
    }
}

/// Summarize the latest bar. Fails on an empty series or one the scorer has
/// not annotated.
pub fn summarize(series: &AnnotatedSeries) -> Result<Summary, DetectionError> {
    let last = series.len().checked_sub(1).ok_or(DetectionError::Input {
        stage: STAGE,
        reason: "empty series".into(),
    })?;
    let scores = series
        .column(Field::ManipulationScore)
        .ok_or(DetectionError::MissingField {
            stage: STAGE,
            field: Field::ManipulationScore,
        })?;
    let probability = series.probability(last).ok_or(DetectionError::MissingField {
        stage: STAGE,
        field: Field::ManipulationProbability,
    })?;

    let score_values: Vec<f64> = scores.values.iter().map(|p| p.value).collect();
    let latest = |field: Field| series.value(field, last).unwrap_or(0.0);
    let direction = Direction::from_sign(latest(Field::ManipulationDirection));

    Ok(Summary {
        symbol: series.symbol.clone(),
        date: series.bars[last].date,
        latest_score: score_values[last],
        probability,
        direction,
        score_trend: ScoreTrend::from_scores(&score_values),
        volume_anomaly: latest(Field::VolumeAnomaly) != 0.0,
        price_manipulation: latest(Field::PriceManipulation) > 0.0,
        big_order_anomaly: latest(Field::BigOrderAnomaly) != 0.0,
        fund_flow_anomaly: latest(Field::FundFlowAnomaly) != 0.0,
        recommendation: recommendation(probability, direction),
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "yes" } else { "no" };
        writeln!(f, "Symbol:              {}", self.symbol)?;
        writeln!(f, "Date:                {}", self.date)?;
        writeln!(f, "Manipulation score:  {:.2}", self.latest_score)?;
        writeln!(f, "Probability:         {}", self.probability)?;
        writeln!(f, "Direction:           {}", self.direction)?;
        writeln!(f, "Score trend:         {}", self.score_trend)?;
        writeln!(f, "Volume anomaly:      {}", flag(self.volume_anomaly))?;
        writeln!(f, "Price manipulation:  {}", flag(self.price_manipulation))?;
        writeln!(f, "Big order anomaly:   {}", flag(self.big_order_anomaly))?;
        writeln!(f, "Fund flow anomaly:   {}", flag(self.fund_flow_anomaly))?;
        write!(f, "Recommendation:      {}", self.recommendation)
    }
}
