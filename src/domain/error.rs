//! Domain error types.

use crate::domain::indicator::Field;

/// Failure of a single analyzer stage.
///
/// Stage errors never escape the pipeline: they are turned into
/// [`StageOutcome::Degraded`](crate::domain::analyzer::StageOutcome) and the
/// series is left as it was before the stage ran.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectionError {
    #[error("{stage}: invalid input: {reason}")]
    Input { stage: &'static str, reason: String },

    #[error("{stage}: missing required field {field}")]
    MissingField { stage: &'static str, field: Field },

    #[error("{stage}: computation failed: {reason}")]
    Computation { stage: &'static str, reason: String },
}

impl DetectionError {
    pub fn stage(&self) -> &'static str {
        match self {
            DetectionError::Input { stage, .. }
            | DetectionError::MissingField { stage, .. }
            | DetectionError::Computation { stage, .. } => stage,
        }
    }
}

/// Top-level error type for smartmoney.
#[derive(Debug, thiserror::Error)]
pub enum SmartMoneyError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("analysis of {symbol} incomplete: {reason}")]
    Incomplete { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SmartMoneyError> for std::process::ExitCode {
    fn from(err: &SmartMoneyError) -> Self {
        let code: u8 = match err {
            SmartMoneyError::Io(_) | SmartMoneyError::Report { .. } => 1,
            SmartMoneyError::ConfigParse { .. }
            | SmartMoneyError::ConfigMissing { .. }
            | SmartMoneyError::ConfigInvalid { .. } => 2,
            SmartMoneyError::Data { .. } => 3,
            SmartMoneyError::Incomplete { .. } => 4,
            SmartMoneyError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
