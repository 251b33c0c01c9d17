//! Data access port trait.

use crate::domain::analyzer::big_order::BigOrderRecord;
use crate::domain::error::SmartMoneyError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Bars for `symbol`, ascending by date with unique dates.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SmartMoneyError>;

    /// Externally observed big orders, `None` when the source has none for
    /// `symbol` and flow has to be estimated from the bars.
    fn fetch_big_orders(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<BigOrderRecord>>, SmartMoneyError>;

    fn list_symbols(&self) -> Result<Vec<String>, SmartMoneyError>;
}
