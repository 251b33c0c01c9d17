#![allow(dead_code)]

use chrono::NaiveDate;
use smartmoney::domain::analyzer::big_order::BigOrderRecord;
use smartmoney::domain::error::SmartMoneyError;
pub use smartmoney::domain::ohlcv::OhlcvBar;
use smartmoney::ports::data_port::DataPort;
use std::collections::HashMap;

pub const PUMP_DUMP_CLOSES: [f64; 10] = [
    100.0, 102.0, 105.0, 108.0, 112.0, 115.0, 118.0, 116.0, 112.0, 108.0,
];
pub const PUMP_DUMP_VOLUMES: [f64; 10] = [
    1e6, 1.2e6, 1.5e6, 1.8e6, 2e6, 2.5e6, 3e6, 3.5e6, 4e6, 3.5e6,
];
pub const SHAKEOUT_CLOSES: [f64; 7] = [100.0, 98.0, 95.0, 90.0, 92.0, 96.0, 100.0];
pub const SHAKEOUT_VOLUMES: [f64; 7] = [1e6, 1.5e6, 2e6, 2.5e6, 2e6, 1.5e6, 1e6];

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub big_orders: HashMap<String, Vec<BigOrderRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            big_orders: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_big_orders(mut self, symbol: &str, records: Vec<BigOrderRecord>) -> Self {
        self.big_orders.insert(symbol.to_string(), records);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SmartMoneyError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmartMoneyError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn fetch_big_orders(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<BigOrderRecord>>, SmartMoneyError> {
        Ok(self.big_orders.get(symbol).cloned())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmartMoneyError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bars with the given closes and volumes on consecutive days from 2024-01-01.
pub fn bars_from(closes: &[f64], volumes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume,
        })
        .collect()
}

/// Deterministic oscillating series long enough to warm up every indicator.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price + (i % 7) as f64 * 1.5 - (i % 3) as f64 + i as f64 * 0.1)
        .collect();
    let volumes: Vec<f64> = (0..count)
        .map(|i| 200_000.0 + (i % 5) as f64 * 30_000.0 + (i % 2) as f64 * 12_000.0)
        .collect();
    bars_from(&closes, &volumes)
}

/// Flat volume baseline with one spike of `multiple` times on the last bar.
pub fn bars_with_final_spike(count: usize, multiple: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = generate_bars(count, 50.0).iter().map(|b| b.close).collect();
    let mut volumes = vec![1_000_000.0; count];
    if let Some(last) = volumes.last_mut() {
        *last *= multiple;
    }
    bars_from(&closes, &volumes)
}
