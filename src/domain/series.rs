//! Annotated bar series: the bars of one symbol plus every indicator column
//! computed for them. Once the scorer has run this is the manipulation
//! result handed to the reporter and cached by the detector.

use crate::domain::analyzer::scorer::Probability;
use crate::domain::indicator::{Field, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub indicators: HashMap<Field, IndicatorSeries>,
}

impl AnnotatedSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
            indicators: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn has(&self, field: Field) -> bool {
        self.indicators.contains_key(&field)
    }

    pub fn column(&self, field: Field) -> Option<&IndicatorSeries> {
        self.indicators.get(&field)
    }

    /// Value of `field` at bar `index`; `None` when the column is absent or
    /// the position is undefined.
    pub fn value(&self, field: Field, index: usize) -> Option<f64> {
        self.column(field).and_then(|c| c.get(index))
    }

    /// Probability tier at bar `index`, once the scorer has run.
    pub fn probability(&self, index: usize) -> Option<Probability> {
        self.value(Field::ManipulationProbability, index)
            .and_then(Probability::from_code)
    }

    /// Insert or replace a column. Columns must be aligned with the bars.
    pub fn insert(&mut self, column: IndicatorSeries) {
        debug_assert_eq!(column.len(), self.bars.len());
        self.indicators.insert(column.field, column);
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
