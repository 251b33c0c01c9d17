//! Report generation port trait.

use crate::domain::error::SmartMoneyError;
use crate::domain::series::AnnotatedSeries;
use std::path::Path;

/// Port for exporting an annotated series.
pub trait ReportPort {
    fn write(&self, series: &AnnotatedSeries, output_path: &Path) -> Result<(), SmartMoneyError>;
}
