//! Cash and open lots for a single simulation run.

use super::lot::{Bucket, Lot};

#[derive(Debug, Clone, PartialEq)]
pub struct LotBook {
    pub cash: f64,
    lots: Vec<Lot>,
}

impl LotBook {
    pub fn new(starting_cash: f64) -> Self {
        LotBook {
            cash: starting_cash,
            lots: Vec::new(),
        }
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }

    pub fn has_short_term(&self) -> bool {
        self.lots.iter().any(|lot| !lot.is_long_term())
    }

    pub fn total_shares(&self) -> u64 {
        self.lots.iter().map(|lot| lot.shares).sum()
    }

    /// cash + every open share valued at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.total_shares() as f64 * price
    }

    pub fn discard(&mut self, index: usize) -> Lot {
        self.lots.remove(index)
    }

    /// Sells the whole lot at `index` and returns the number of shares sold.
    pub fn sell(&mut self, index: usize, price: f64) -> u64 {
        let lot = self.lots.remove(index);
        self.cash += lot.market_value(price);
        lot.shares
    }

    /// Buys up to `max_shares` one at a time while cash still exceeds `price`.
    pub fn buy_shares(&mut self, price: f64, max_shares: u64) -> u64 {
        let mut bought = 0;
        while bought < max_shares && self.cash > price {
            self.cash -= price;
            bought += 1;
        }
        bought
    }

    /// Splits freshly bought shares into a short-term lot and a long-term lot.
    pub fn open_lots(&mut self, shares: u64, price: f64, day: usize, long_term_ratio: f64) {
        let long_shares = if long_term_ratio > 0.0 {
            (shares as f64 * long_term_ratio).floor() as u64
        } else {
            0
        };
        let short_shares = shares - long_shares;

        if short_shares > 0 {
            self.lots.push(Lot {
                buy_price: price,
                shares: short_shares,
                buy_day: day,
                bucket: Bucket::ShortTerm,
            });
        }
        if long_shares > 0 {
            self.lots.push(Lot {
                buy_price: price,
                shares: long_shares,
                buy_day: day,
                bucket: Bucket::LongTerm,
            });
        }
    }

    pub fn into_lots(self) -> Vec<Lot> {
        self.lots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_book() {
        let book = LotBook::new(1000.0);
        assert_eq!(book.cash, 1000.0);
        assert_eq!(book.lot_count(), 0);
        assert_eq!(book.total_value(50.0), 1000.0);
    }

    #[test]
    fn buy_shares_stops_when_cash_runs_out() {
        let mut book = LotBook::new(100.0);
        assert_eq!(book.buy_shares(30.0, 10), 3);
        assert!((book.cash - 10.0).abs() < 1e-12);
    }

    #[test]
    fn buy_shares_requires_cash_strictly_above_price() {
        let mut book = LotBook::new(60.0);
        assert_eq!(book.buy_shares(30.0, 10), 1);
        assert_eq!(book.cash, 30.0);
    }

    #[test]
    fn open_lots_splits_by_ratio() {
        let mut book = LotBook::new(0.0);
        book.open_lots(10, 20.0, 4, 0.25);
        assert_eq!(book.lot_count(), 2);
        assert_eq!(book.lots()[0].bucket, Bucket::ShortTerm);
        assert_eq!(book.lots()[0].shares, 8);
        assert_eq!(book.lots()[1].bucket, Bucket::LongTerm);
        assert_eq!(book.lots()[1].shares, 2);
        assert_eq!(book.lots()[1].buy_day, 4);
    }

    #[test]
    fn open_lots_skips_empty_long_bucket() {
        let mut book = LotBook::new(0.0);
        book.open_lots(3, 20.0, 1, 0.25);
        assert_eq!(book.lot_count(), 1);
        assert!(book.has_short_term());
    }

    #[test]
    fn sell_moves_full_proceeds_to_cash() {
        let mut book = LotBook::new(0.0);
        book.open_lots(5, 10.0, 0, 0.0);
        let sold = book.sell(0, 12.0);
        assert_eq!(sold, 5);
        assert_eq!(book.cash, 60.0);
        assert_eq!(book.lot_count(), 0);
    }

    #[test]
    fn total_value_counts_all_lots() {
        let mut book = LotBook::new(100.0);
        book.open_lots(10, 10.0, 0, 0.5);
        assert_eq!(book.total_shares(), 10);
        assert_eq!(book.total_value(11.0), 210.0);
    }
}
