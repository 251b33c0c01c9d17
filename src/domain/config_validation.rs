//! Configuration validation.
//!
//! Validates the `[detector]` section before a detector is built.

use crate::domain::config::SECTION;
use crate::domain::error::SmartMoneyError;
use crate::ports::config_port::ConfigPort;

pub fn validate_detector_config(config: &dyn ConfigPort) -> Result<(), SmartMoneyError> {
    validate_positive(config, "volume_threshold", 3.0)?;
    validate_window(config, "volume_window")?;
    validate_window(config, "price_manipulation_window")?;
    validate_positive(config, "big_order_threshold", 1_000_000.0)?;
    validate_concentration(config)?;
    validate_score_threshold(config)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> SmartMoneyError {
    SmartMoneyError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Present keys must parse; `get_double` would silently fall back otherwise.
fn require_numeric(config: &dyn ConfigPort, key: &str) -> Result<(), SmartMoneyError> {
    match config.get_string(SECTION, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => {
            Err(invalid(key, &format!("{} is not a number", raw.trim())))
        }
        _ => Ok(()),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str, default: f64) -> Result<(), SmartMoneyError> {
    require_numeric(config, key)?;
    let value = config.get_double(SECTION, key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(key, &format!("{key} must be positive")));
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), SmartMoneyError> {
    if let Some(raw) = config.get_string(SECTION, key) {
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 2 => {}
            Ok(_) => return Err(invalid(key, &format!("{key} must be at least 2 bars"))),
            Err(_) => return Err(invalid(key, &format!("{key} must be a whole number of bars"))),
        }
    }
    Ok(())
}

fn validate_concentration(config: &dyn ConfigPort) -> Result<(), SmartMoneyError> {
    require_numeric(config, "concentration_threshold")?;
    let value = config.get_double(SECTION, "concentration_threshold", 0.6);
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "concentration_threshold",
            "concentration_threshold must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_score_threshold(config: &dyn ConfigPort) -> Result<(), SmartMoneyError> {
    require_numeric(config, "manipulation_score_threshold")?;
    let value = config.get_double(SECTION, "manipulation_score_threshold", 70.0);
    if value <= 0.0 || value > 100.0 {
        return Err(invalid(
            "manipulation_score_threshold",
            "manipulation_score_threshold must be in (0, 100]",
        ));
    }
    Ok(())
}
