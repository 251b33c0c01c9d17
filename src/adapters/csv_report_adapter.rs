//! Annotated series CSV export.
//!
//! One row per bar: the bar columns followed by every indicator column in
//! [`Field::ALL`] order. Undefined values and columns from degraded stages
//! are written as empty cells; the probability column holds its label.

use crate::domain::error::SmartMoneyError;
use crate::domain::indicator::Field;
use crate::domain::series::AnnotatedSeries;
use crate::ports::report_port::ReportPort;
use std::path::Path;

const BAR_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn header() -> Vec<&'static str> {
        BAR_COLUMNS
            .iter()
            .copied()
            .chain(Field::ALL.iter().map(|f| f.name()))
            .collect()
    }

    fn cell(series: &AnnotatedSeries, field: Field, index: usize) -> String {
        if field == Field::ManipulationProbability {
            return series
                .probability(index)
                .map(|p| p.label().to_string())
                .unwrap_or_default();
        }
        series
            .value(field, index)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    fn row(series: &AnnotatedSeries, index: usize) -> Vec<String> {
        let bar = &series.bars[index];
        let mut row = vec![
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        row.extend(Field::ALL.iter().map(|f| Self::cell(series, *f, index)));
        row
    }
}

fn report_error(path: &Path, e: impl std::fmt::Display) -> SmartMoneyError {
    SmartMoneyError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, series: &AnnotatedSeries, output_path: &Path) -> Result<(), SmartMoneyError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| report_error(output_path, e))?;
        writer
            .write_record(Self::header())
            .map_err(|e| report_error(output_path, e))?;
        for index in 0..series.len() {
            writer
                .write_record(Self::row(series, index))
                .map_err(|e| report_error(output_path, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}
