//! Price data port trait.

use crate::domain::error::BiasTraderError;
use crate::domain::price_series::PriceSeries;

pub trait PricePort {
    /// Daily closes for `symbol`, oldest first.
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, BiasTraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, BiasTraderError>;
}
