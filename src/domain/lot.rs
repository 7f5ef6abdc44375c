//! Open lots created by buy events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    ShortTerm,
    LongTerm,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::ShortTerm => write!(f, "SHORT_TERM"),
            Bucket::LongTerm => write!(f, "LONG_TERM"),
        }
    }
}

/// Shares from one buy event. A lot is sold in full or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub buy_price: f64,
    pub shares: u64,
    pub buy_day: usize,
    pub bucket: Bucket,
}

impl Lot {
    pub fn is_long_term(&self) -> bool {
        self.bucket == Bucket::LongTerm
    }

    /// Zero-share or non-positive-price lots can never be sold sensibly.
    pub fn is_malformed(&self) -> bool {
        self.shares == 0 || !(self.buy_price > 0.0)
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Percentage gain of `price` over the buy price.
    pub fn gain_pct(&self, price: f64) -> f64 {
        (price - self.buy_price) / self.buy_price * 100.0
    }

    pub fn held_days(&self, day: usize) -> usize {
        day.saturating_sub(self.buy_day)
    }
}
