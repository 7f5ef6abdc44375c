//! Day-by-day simulation engine.
//!
//! Replays a [`PriceSeries`] one close at a time. Each day runs a sell phase
//! over the open lots (newest first) followed by a buy phase driven by the
//! deepest drawdown inside the lookback window. The engine is deterministic
//! and holds no state outside a single call.

use std::fmt;
use std::str::FromStr;

use super::lot::Lot;
use super::lot_book::LotBook;
use super::price_series::PriceSeries;
use super::sim_config::SimulationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Hold => write!(f, "HOLD"),
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Decision::Buy),
            "SELL" => Ok(Decision::Sell),
            "HOLD" => Ok(Decision::Hold),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// What the engine did on the final simulated day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastAction {
    pub decision: Decision,
    pub shares: u64,
    pub price: f64,
}

impl LastAction {
    fn hold(price: f64) -> Self {
        LastAction {
            decision: Decision::Hold,
            shares: 0,
            price,
        }
    }

    /// True for a BUY or SELL that actually moved shares.
    pub fn is_action(&self) -> bool {
        self.decision != Decision::Hold && self.shares > 0
    }
}

/// Per-day series recorded in trace mode. All four vectors have one entry
/// per day of the input series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub total_value: Vec<f64>,
    pub shares_held: Vec<u64>,
    pub cash: Vec<f64>,
    /// Shares bought (positive) or sold (negative) that day; 0 when idle.
    pub event: Vec<i64>,
}

impl Trace {
    fn with_capacity(days: usize) -> Self {
        Trace {
            total_value: Vec::with_capacity(days),
            shares_held: Vec::with_capacity(days),
            cash: Vec::with_capacity(days),
            event: Vec::with_capacity(days),
        }
    }

    fn record(&mut self, book: &LotBook, price: f64, event: i64) {
        self.total_value.push(book.total_value(price));
        self.shares_held.push(book.total_shares());
        self.cash.push(book.cash);
        self.event.push(event);
    }

    pub fn len(&self) -> usize {
        self.total_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_value.is_empty()
    }

    pub fn buy_markers(&self) -> Vec<u64> {
        self.event.iter().map(|&e| e.max(0) as u64).collect()
    }

    pub fn sell_markers(&self) -> Vec<u64> {
        self.event.iter().map(|&e| e.min(0).unsigned_abs()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub starting_cash: f64,
    pub ending_cash: f64,
    pub open_lots: Vec<Lot>,
    pub ending_value: f64,
    pub profit: f64,
    pub config: SimulationConfig,
    pub last_action: LastAction,
    /// Final close of the series; 0 for an empty series.
    pub last_price: f64,
    pub trace: Option<Trace>,
}

impl SimulationResult {
    /// Profit relative to the starting cash, the optimizer's ranking metric.
    pub fn profit_ratio(&self) -> f64 {
        if self.starting_cash > 0.0 && self.starting_cash.is_finite() {
            self.profit / self.starting_cash
        } else {
            f64::NEG_INFINITY
        }
    }

    pub fn open_shares(&self) -> u64 {
        self.open_lots.iter().map(|lot| lot.shares).sum()
    }
}

/// Runs the strategy over `series` with `config`.
///
/// With `trace` set, the result carries one [`Trace`] entry per day.
pub fn simulate(series: &PriceSeries, config: &SimulationConfig, trace: bool) -> SimulationResult {
    let closes = series.closes();
    let starting_cash = config.starting_cash();
    let mut book = LotBook::new(starting_cash);

    let Some(first_close) = series.first_close() else {
        return SimulationResult {
            starting_cash,
            ending_cash: starting_cash,
            open_lots: Vec::new(),
            ending_value: starting_cash,
            profit: 0.0,
            config: *config,
            last_action: LastAction::hold(0.0),
            last_price: 0.0,
            trace: trace.then(Trace::default),
        };
    };

    let mut recorder = trace.then(|| Trace::with_capacity(closes.len()));
    if let Some(t) = recorder.as_mut() {
        t.record(&book, first_close, 0);
    }

    let mut last_action = LastAction::hold(first_close);

    for day in 1..closes.len() {
        let price = closes[day];
        last_action = LastAction::hold(0.0);

        let sold = sell_phase(&mut book, config, day, price);
        if sold > 0 {
            last_action = LastAction {
                decision: Decision::Sell,
                shares: sold,
                price,
            };
        }

        let bought = buy_phase(&mut book, config, closes, day);
        if bought > 0 {
            last_action = LastAction {
                decision: Decision::Buy,
                shares: bought,
                price,
            };
        }

        if let Some(t) = recorder.as_mut() {
            let event = if bought > 0 {
                bought as i64
            } else {
                -(sold as i64)
            };
            t.record(&book, price, event);
        }
    }

    let last_price = series.last_close().unwrap_or(first_close);
    let ending_value = book.total_value(last_price);
    let ending_cash = book.cash;

    SimulationResult {
        starting_cash,
        ending_cash,
        open_lots: book.into_lots(),
        ending_value,
        profit: ending_value - starting_cash,
        config: *config,
        last_action,
        last_price,
        trace: recorder,
    }
}

/// Sells every eligible lot and returns the total shares sold.
fn sell_phase(book: &mut LotBook, config: &SimulationConfig, day: usize, price: f64) -> u64 {
    // Long-term lots are a reserve: they stay put while any short-term lot
    // was open at the start of the day.
    let short_term_open = book.has_short_term();
    let mut sold = 0;

    for index in (0..book.lot_count()).rev() {
        let lot = &book.lots()[index];
        if lot.is_malformed() {
            book.discard(index);
            continue;
        }

        let held_days = lot.held_days(day);
        let required_hold = if lot.is_long_term() {
            config.long_term_min_hold_days()
        } else {
            config.min_hold_days()
        };
        if required_hold as usize > held_days {
            continue;
        }
        if lot.is_long_term() && short_term_open {
            continue;
        }

        if price > lot.buy_price && lot.gain_pct(price) > config.sell_threshold_pct() {
            sold += book.sell(index, price);
        }
    }

    sold
}

/// Buys into the deepest drawdown of the lookback window; returns shares bought.
fn buy_phase(book: &mut LotBook, config: &SimulationConfig, closes: &[f64], day: usize) -> u64 {
    let price = closes[day];
    if !(price > 0.0) || book.cash <= price {
        return 0;
    }

    let lookback_window = (config.lookback_days() as usize).min(day);
    let deepest_drop = (1..=lookback_window)
        .map(|back| closes[day - back])
        .filter(|&prior| prior > price && prior > 0.0)
        .map(|prior| (price - prior) / prior * 100.0)
        .fold(0.0_f64, f64::min);

    if deepest_drop >= -config.buy_threshold_pct() {
        return 0;
    }

    let max_shares = (deepest_drop.abs() * config.position_scale()).floor() as u64;
    let bought = book.buy_shares(price, max_shares);
    if bought > 0 {
        book.open_lots(bought, price, day, config.long_term_ratio());
    }
    bought
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lot::Bucket;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes.to_vec())
    }

    #[test]
    fn empty_series_is_zero_activity() {
        let config = SimulationConfig::new(1000.0, 5.0, 5.0);
        let r = simulate(&series(&[]), &config, true);
        assert_eq!(r.ending_cash, 1000.0);
        assert_eq!(r.ending_value, 1000.0);
        assert_eq!(r.profit, 0.0);
        assert_eq!(r.last_action.decision, Decision::Hold);
        assert!(r.open_lots.is_empty());
        assert!(r.trace.unwrap().is_empty());
    }

    #[test]
    fn single_day_holds() {
        let config = SimulationConfig::new(1000.0, 5.0, 5.0);
        let r = simulate(&series(&[42.0]), &config, false);
        assert_eq!(r.profit, 0.0);
        assert_eq!(r.last_action.decision, Decision::Hold);
        assert_eq!(r.last_price, 42.0);
        assert_eq!(r.last_action.price, 42.0);
        assert!(r.trace.is_none());
    }

    #[test]
    fn drawdown_scenario_buys_twice() {
        let config = SimulationConfig::new(1000.0, 5.0, 5.0).with_lookback_days(2);
        let r = simulate(&series(&[100.0, 90.0, 81.0]), &config, true);

        assert_relative_eq!(r.ending_cash, 19.0, epsilon = 1e-9);
        assert_eq!(r.open_shares(), 11);
        assert_relative_eq!(r.ending_value, 910.0, epsilon = 1e-9);
        assert_relative_eq!(r.profit, -90.0, epsilon = 1e-9);
        assert_eq!(r.last_action.decision, Decision::Buy);
        assert_eq!(r.last_action.shares, 1);
        assert_eq!(r.last_action.price, 81.0);

        let trace = r.trace.unwrap();
        assert_eq!(trace.event, vec![0, 10, 1]);
        assert_eq!(trace.shares_held, vec![0, 10, 11]);
        assert_relative_eq!(trace.cash[1], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn rising_series_never_trades() {
        let config = SimulationConfig::new(1000.0, 1.0, 1.0);
        let r = simulate(&series(&[10.0, 11.0, 12.0, 13.0, 14.0]), &config, false);
        assert_eq!(r.profit, 0.0);
        assert_eq!(r.ending_cash, 1000.0);
        assert_eq!(r.last_action.decision, Decision::Hold);
        assert!(r.open_lots.is_empty());
    }

    #[test]
    fn drop_must_exceed_buy_threshold() {
        // exactly a 10% drop against a 10% threshold does not buy
        let config = SimulationConfig::new(1000.0, 5.0, 10.0);
        let r = simulate(&series(&[100.0, 90.0]), &config, false);
        assert!(r.open_lots.is_empty());
    }

    #[test]
    fn sells_after_gain_exceeds_threshold() {
        let config = SimulationConfig::new(1000.0, 5.0, 6.0);
        let r = simulate(&series(&[100.0, 90.0, 95.0]), &config, true);
        // day 2: gain (95-90)/90 = 5.55% > 5%
        assert!(r.open_lots.is_empty());
        assert_eq!(r.last_action.decision, Decision::Sell);
        assert_eq!(r.last_action.shares, 10);
        assert_relative_eq!(r.ending_cash, 1000.0 - 900.0 + 950.0, epsilon = 1e-9);
        assert_eq!(r.trace.unwrap().event, vec![0, 10, -10]);
    }

    #[test]
    fn min_hold_delays_sale() {
        let config = SimulationConfig::new(1000.0, 5.0, 6.0).with_min_hold_days(2);
        let r = simulate(&series(&[100.0, 90.0, 95.0, 96.0]), &config, false);
        // held 1 day on day 2, 2 days on day 3
        assert!(r.open_lots.is_empty());
        assert_eq!(r.last_action.decision, Decision::Sell);
        assert_eq!(r.last_action.price, 96.0);
    }

    #[test]
    fn long_term_lot_waits_for_short_term_lots() {
        let config = SimulationConfig::new(1000.0, 5.0, 6.0).with_long_term(0.5, 0);
        let r = simulate(&series(&[100.0, 90.0, 95.0, 96.0]), &config, true);
        let trace = r.trace.unwrap();
        // day 1 buys 10 (5 short, 5 long); day 2 sells the short lot only
        assert_eq!(trace.event[2], -5);
        assert_eq!(trace.shares_held[2], 5);
        // day 3 starts with no short-term lot, so the long lot sells
        assert_eq!(trace.event[3], -5);
        assert!(r.open_lots.is_empty());
    }

    #[test]
    fn long_term_hold_is_separate() {
        let config = SimulationConfig::new(1000.0, 5.0, 6.0)
            .with_long_term(0.5, 10)
            .with_min_hold_days(0);
        let r = simulate(&series(&[100.0, 90.0, 95.0, 96.0]), &config, false);
        assert_eq!(r.open_lots.len(), 1);
        assert_eq!(r.open_lots[0].bucket, Bucket::LongTerm);
    }

    #[test]
    fn buy_label_wins_on_mixed_days() {
        // day 1 buys 50 at 50; day 2 sells them at 60 and, with 100 still
        // inside the window, buys 40 more on the same day
        let config = SimulationConfig::new(10_000.0, 5.0, 5.0).with_lookback_days(5);
        let r = simulate(&series(&[100.0, 50.0, 60.0]), &config, true);
        let trace = r.trace.as_ref().unwrap();
        assert_eq!(r.last_action.decision, Decision::Buy);
        assert_eq!(r.last_action.price, 60.0);
        assert_eq!(r.last_action.shares, 40);
        assert_eq!(trace.event[2], 40);
        assert_eq!(r.open_shares(), 40);
        assert_relative_eq!(r.ending_cash, 10_000.0 - 2500.0 + 3000.0 - 2400.0, epsilon = 1e-9);
    }

    #[test]
    fn position_scale_sizes_the_buy() {
        let config = SimulationConfig::new(10_000.0, 50.0, 5.0).with_position_scale(2.5);
        let r = simulate(&series(&[100.0, 90.0]), &config, false);
        assert_eq!(r.open_shares(), 25);
    }

    #[test]
    fn lookback_limits_the_scan() {
        // each daily step is ~2%, only a 4-day window sees an 8% drawdown
        let closes = [100.0, 98.0, 96.0, 94.0, 92.0];
        let narrow = SimulationConfig::new(10_000.0, 50.0, 5.0).with_lookback_days(1);
        assert!(simulate(&series(&closes), &narrow, false).open_lots.is_empty());

        let wide = narrow.with_lookback_days(4);
        let r = simulate(&series(&closes), &wide, false);
        assert_eq!(r.last_action.decision, Decision::Buy);
        assert_eq!(r.last_action.price, 92.0);
    }

    #[test]
    fn non_positive_closes_never_buy() {
        let config = SimulationConfig::new(1000.0, 5.0, 5.0);
        let r = simulate(&series(&[100.0, 0.0, -5.0]), &config, true);
        assert!(r.open_lots.is_empty());
        assert_eq!(r.ending_cash, 1000.0);
    }

    #[test]
    fn conservation_holds_every_day() {
        let closes = [100.0, 95.0, 90.0, 97.0, 85.0, 99.0, 101.0, 80.0];
        let config = SimulationConfig::new(2000.0, 3.0, 4.0).with_long_term(0.25, 2);
        let s = series(&closes);
        let r = simulate(&s, &config, true);
        let trace = r.trace.unwrap();
        assert_eq!(trace.len(), closes.len());
        for day in 0..closes.len() {
            let expected = trace.cash[day] + trace.shares_held[day] as f64 * closes[day];
            assert_eq!(trace.total_value[day], expected);
        }
    }

    #[test]
    fn markers_split_events() {
        let trace = Trace {
            total_value: vec![0.0; 3],
            shares_held: vec![0; 3],
            cash: vec![0.0; 3],
            event: vec![0, 4, -3],
        };
        assert_eq!(trace.buy_markers(), vec![0, 4, 0]);
        assert_eq!(trace.sell_markers(), vec![0, 0, 3]);
    }

    #[test]
    fn decision_round_trips_through_labels() {
        assert_eq!("buy".parse::<Decision>().unwrap(), Decision::Buy);
        assert_eq!(Decision::Sell.to_string(), "SELL");
        assert!("maybe".parse::<Decision>().is_err());
    }
}
