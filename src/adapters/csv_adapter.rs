//! CSV file data adapter.
//!
//! Layout under the base directory:
//! - `{SYMBOL}.csv`: `date,open,high,low,close,volume`
//! - `{SYMBOL}_big_orders.csv` (optional): `date,volume,direction`

use crate::domain::analyzer::big_order::BigOrderRecord;
use crate::domain::error::SmartMoneyError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const BIG_ORDER_SUFFIX: &str = "_big_orders.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn bars_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn big_orders_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}{BIG_ORDER_SUFFIX}"))
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SmartMoneyError> {
    let content = fs::read_to_string(path).map_err(|e| SmartMoneyError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    rdr.deserialize::<T>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| SmartMoneyError::Data {
                reason: format!("{} row {}: {}", path.display(), i + 1, e),
            })
        })
        .collect()
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SmartMoneyError> {
        let path = self.bars_path(symbol);
        let mut bars: Vec<OhlcvBar> = read_rows(&path)?;
        bars.sort_by_key(|b| b.date);

        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SmartMoneyError::Data {
                reason: format!("duplicate date {} in {}", pair[0].date, path.display()),
            });
        }
        debug!(symbol, bars = bars.len(), "loaded bars");
        Ok(bars)
    }

    fn fetch_big_orders(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<BigOrderRecord>>, SmartMoneyError> {
        let path = self.big_orders_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        let mut records: Vec<BigOrderRecord> = read_rows(&path)?;
        records.sort_by_key(|r| r.date);
        debug!(symbol, records = records.len(), "loaded big orders");
        Ok(Some(records))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmartMoneyError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SmartMoneyError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SmartMoneyError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.ends_with(BIG_ORDER_SUFFIX) {
                continue;
            }
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
