//! Parameter grid searched by the optimizer.

use super::sim_config::{ConfigRecord, DEFAULT_LOOKBACK_DAYS, SimulationConfig};

/// Seven search axes. Starting cash is the outer axis; the sell and buy
/// thresholds share one value list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub starting_cash: Vec<f64>,
    pub thresholds: Vec<f64>,
    pub position_scales: Vec<f64>,
    pub min_hold_days: Vec<u32>,
    pub long_term_ratios: Vec<f64>,
    pub long_term_min_hold_days: Vec<u32>,
    pub lookback_days: u32,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            starting_cash: stepped(100.0, 10_000.0, 100.0),
            thresholds: stepped(1.0, 25.0, 0.5),
            position_scales: vec![0.5, 0.75, 1.0, 1.25],
            min_hold_days: vec![0, 2, 5],
            long_term_ratios: vec![0.0, 0.25, 0.5],
            long_term_min_hold_days: vec![0, 10, 20],
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// One inner-axis point; combined with a starting cash it becomes a config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub sell_threshold_pct: f64,
    pub buy_threshold_pct: f64,
    pub position_scale: f64,
    pub min_hold_days: u32,
    pub long_term_ratio: f64,
    pub long_term_min_hold_days: u32,
}

impl ParameterGrid {
    /// Combinations per starting-cash value.
    pub fn inner_combinations(&self) -> u64 {
        let thresholds = self.thresholds.len() as u64;
        thresholds
            * thresholds
            * self.position_scales.len() as u64
            * self.min_hold_days.len() as u64
            * self.long_term_ratios.len() as u64
            * self.long_term_min_hold_days.len() as u64
    }

    pub fn total_combinations(&self) -> u64 {
        self.starting_cash.len() as u64 * self.inner_combinations()
    }

    /// Inner axes in enumeration order: sell, buy, scale, short hold,
    /// long-term ratio, long-term hold (last varies fastest).
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.thresholds.iter().flat_map(move |&sell| {
            self.thresholds.iter().flat_map(move |&buy| {
                self.position_scales.iter().flat_map(move |&scale| {
                    self.min_hold_days.iter().flat_map(move |&hold| {
                        self.long_term_ratios.iter().flat_map(move |&ratio| {
                            self.long_term_min_hold_days
                                .iter()
                                .map(move |&lt_hold| Candidate {
                                    sell_threshold_pct: sell,
                                    buy_threshold_pct: buy,
                                    position_scale: scale,
                                    min_hold_days: hold,
                                    long_term_ratio: ratio,
                                    long_term_min_hold_days: lt_hold,
                                })
                        })
                    })
                })
            })
        })
    }

    pub fn config_for(&self, starting_cash: f64, candidate: &Candidate) -> SimulationConfig {
        SimulationConfig::from_record(&ConfigRecord {
            starting_cash: Some(starting_cash),
            sell_threshold_pct: candidate.sell_threshold_pct,
            buy_threshold_pct: candidate.buy_threshold_pct,
            lookback_days: Some(self.lookback_days),
            position_scale: Some(candidate.position_scale),
            min_hold_days: Some(candidate.min_hold_days as f64),
            long_term_ratio: Some(candidate.long_term_ratio),
            long_term_min_hold_days: Some(candidate.long_term_min_hold_days as f64),
        })
    }
}

/// Inclusive arithmetic range computed by index so the values do not drift.
pub fn stepped(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || end < start {
        return Vec::new();
    }
    let count = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + step * i as f64).collect()
}
