//! Symbol-keyed records of winning parameters, and the replay path.

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::price_series::PriceSeries;
use super::sim_config::{ConfigRecord, SimulationConfig};
use super::simulation::{Decision, SimulationResult, simulate};

#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecord {
    pub symbol: String,
    pub starting_cash: f64,
    pub sell_threshold_pct: f64,
    pub buy_threshold_pct: f64,
    pub position_scale: Option<f64>,
    pub min_hold_days: Option<f64>,
    pub long_term_ratio: Option<f64>,
    pub long_term_min_hold_days: Option<f64>,
    pub profit: f64,
    pub last_decision: Decision,
    pub last_amount: u64,
    pub last_action_price: f64,
    pub last_price: f64,
    pub starred: bool,
    pub saved_on: NaiveDate,
}

impl SavedRecord {
    pub fn from_result(symbol: &str, result: &SimulationResult, saved_on: NaiveDate) -> Self {
        let config = &result.config;
        SavedRecord {
            symbol: symbol.trim().to_uppercase(),
            starting_cash: config.starting_cash(),
            sell_threshold_pct: config.sell_threshold_pct(),
            buy_threshold_pct: config.buy_threshold_pct(),
            position_scale: Some(config.position_scale()),
            min_hold_days: Some(config.min_hold_days() as f64),
            long_term_ratio: Some(config.long_term_ratio()),
            long_term_min_hold_days: Some(config.long_term_min_hold_days() as f64),
            profit: result.profit,
            last_decision: result.last_action.decision,
            last_amount: result.last_action.shares,
            last_action_price: result.last_action.price,
            last_price: result.last_price,
            starred: false,
            saved_on,
        }
    }

    /// Rebuilds the configuration; absent or non-finite knobs take defaults.
    pub fn to_config(&self, lookback_days: u32) -> SimulationConfig {
        SimulationConfig::from_record(&ConfigRecord {
            starting_cash: Some(self.starting_cash),
            sell_threshold_pct: self.sell_threshold_pct,
            buy_threshold_pct: self.buy_threshold_pct,
            lookback_days: Some(lookback_days),
            position_scale: self.position_scale,
            min_hold_days: self.min_hold_days,
            long_term_ratio: self.long_term_ratio,
            long_term_min_hold_days: self.long_term_min_hold_days,
        })
    }

    pub fn profit_pct(&self) -> f64 {
        if self.starting_cash > 0.0 && self.starting_cash.is_finite() {
            self.profit / self.starting_cash * 100.0
        } else {
            0.0
        }
    }

    /// BUY or SELL with a positive amount.
    pub fn is_action(&self) -> bool {
        self.last_decision != Decision::Hold && self.last_amount > 0
    }
}

/// Replays saved parameters over a fresh price series.
pub fn replay(series: &PriceSeries, record: &SavedRecord, lookback_days: u32) -> SimulationResult {
    simulate(series, &record.to_config(lookback_days), false)
}

/// Actionable records first, then descending profit percent.
pub fn sort_saved(records: &mut [SavedRecord]) {
    records.sort_by(|a, b| {
        b.is_action().cmp(&a.is_action()).then_with(|| {
            b.profit_pct()
                .partial_cmp(&a.profit_pct())
                .unwrap_or(Ordering::Equal)
        })
    });
}
