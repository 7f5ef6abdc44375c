//! Simulation parameters.
//!
//! All normalisation happens in the constructors; the engine reads the
//! fields through getters and never re-validates them.

pub const DEFAULT_STARTING_CASH: f64 = 4000.0;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
pub const DEFAULT_POSITION_SCALE: f64 = 1.0;

pub const MIN_POSITION_SCALE: f64 = 0.25;
pub const MAX_POSITION_SCALE: f64 = 4.0;
pub const MIN_LONG_TERM_RATIO: f64 = 0.0;
pub const MAX_LONG_TERM_RATIO: f64 = 0.9;

/// Raw parameter values as supplied by a caller or a persisted record.
///
/// `None` (or a non-finite number) means "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigRecord {
    pub starting_cash: Option<f64>,
    pub sell_threshold_pct: f64,
    pub buy_threshold_pct: f64,
    pub lookback_days: Option<u32>,
    pub position_scale: Option<f64>,
    pub min_hold_days: Option<f64>,
    pub long_term_ratio: Option<f64>,
    pub long_term_min_hold_days: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    starting_cash: f64,
    sell_threshold_pct: f64,
    buy_threshold_pct: f64,
    lookback_days: u32,
    position_scale: f64,
    min_hold_days: u32,
    long_term_ratio: f64,
    long_term_min_hold_days: u32,
}

impl SimulationConfig {
    /// Threshold-only config: every secondary knob at its default.
    pub fn new(starting_cash: f64, sell_threshold_pct: f64, buy_threshold_pct: f64) -> Self {
        Self::from_record(&ConfigRecord {
            starting_cash: Some(starting_cash),
            sell_threshold_pct,
            buy_threshold_pct,
            ..ConfigRecord::default()
        })
    }

    pub fn from_record(record: &ConfigRecord) -> Self {
        let starting_cash = match record.starting_cash {
            Some(cash) if cash.is_finite() && cash > 0.0 => cash,
            _ => DEFAULT_STARTING_CASH,
        };
        SimulationConfig {
            starting_cash,
            sell_threshold_pct: record.sell_threshold_pct,
            buy_threshold_pct: record.buy_threshold_pct,
            lookback_days: record.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS).max(1),
            position_scale: finite_or(record.position_scale, DEFAULT_POSITION_SCALE)
                .clamp(MIN_POSITION_SCALE, MAX_POSITION_SCALE),
            min_hold_days: whole_days(record.min_hold_days),
            long_term_ratio: finite_or(record.long_term_ratio, 0.0)
                .clamp(MIN_LONG_TERM_RATIO, MAX_LONG_TERM_RATIO),
            long_term_min_hold_days: whole_days(record.long_term_min_hold_days),
        }
    }

    pub fn with_lookback_days(self, lookback_days: u32) -> Self {
        Self {
            lookback_days: lookback_days.max(1),
            ..self
        }
    }

    pub fn with_position_scale(self, position_scale: f64) -> Self {
        Self {
            position_scale: finite_or(Some(position_scale), DEFAULT_POSITION_SCALE)
                .clamp(MIN_POSITION_SCALE, MAX_POSITION_SCALE),
            ..self
        }
    }

    pub fn with_min_hold_days(self, min_hold_days: u32) -> Self {
        Self {
            min_hold_days,
            ..self
        }
    }

    pub fn with_long_term(self, ratio: f64, min_hold_days: u32) -> Self {
        Self {
            long_term_ratio: finite_or(Some(ratio), 0.0)
                .clamp(MIN_LONG_TERM_RATIO, MAX_LONG_TERM_RATIO),
            long_term_min_hold_days: min_hold_days,
            ..self
        }
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn sell_threshold_pct(&self) -> f64 {
        self.sell_threshold_pct
    }

    pub fn buy_threshold_pct(&self) -> f64 {
        self.buy_threshold_pct
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn position_scale(&self) -> f64 {
        self.position_scale
    }

    pub fn min_hold_days(&self) -> u32 {
        self.min_hold_days
    }

    pub fn long_term_ratio(&self) -> f64 {
        self.long_term_ratio
    }

    pub fn long_term_min_hold_days(&self) -> u32 {
        self.long_term_min_hold_days
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Floors to whole days; negative, absent and non-finite values become 0.
fn whole_days(value: Option<f64>) -> u32 {
    let days = finite_or(value, 0.0).floor();
    if days <= 0.0 {
        0
    } else if days >= u32::MAX as f64 {
        u32::MAX
    } else {
        days as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_defaults_for_secondary_knobs() {
        let c = SimulationConfig::new(1000.0, 5.0, 3.0);
        assert_eq!(c.starting_cash(), 1000.0);
        assert_eq!(c.sell_threshold_pct(), 5.0);
        assert_eq!(c.buy_threshold_pct(), 3.0);
        assert_eq!(c.lookback_days(), DEFAULT_LOOKBACK_DAYS);
        assert_eq!(c.position_scale(), 1.0);
        assert_eq!(c.min_hold_days(), 0);
        assert_eq!(c.long_term_ratio(), 0.0);
        assert_eq!(c.long_term_min_hold_days(), 0);
    }

    #[test]
    fn position_scale_is_clamped() {
        let c = SimulationConfig::new(1000.0, 5.0, 5.0);
        assert_eq!(c.with_position_scale(0.01).position_scale(), 0.25);
        assert_eq!(c.with_position_scale(9.0).position_scale(), 4.0);
        assert_eq!(c.with_position_scale(1.25).position_scale(), 1.25);
        assert_eq!(c.with_position_scale(f64::NAN).position_scale(), 1.0);
    }

    #[test]
    fn long_term_ratio_is_clamped() {
        let c = SimulationConfig::new(1000.0, 5.0, 5.0);
        assert_eq!(c.with_long_term(-0.5, 3).long_term_ratio(), 0.0);
        assert_eq!(c.with_long_term(1.5, 3).long_term_ratio(), 0.9);
        assert_eq!(c.with_long_term(0.25, 3).long_term_min_hold_days(), 3);
    }

    #[test]
    fn lookback_never_drops_below_one() {
        let c = SimulationConfig::new(1000.0, 5.0, 5.0).with_lookback_days(0);
        assert_eq!(c.lookback_days(), 1);
    }

    #[test]
    fn record_defaults_absent_fields() {
        let c = SimulationConfig::from_record(&ConfigRecord {
            starting_cash: None,
            sell_threshold_pct: 2.5,
            buy_threshold_pct: 4.0,
            ..ConfigRecord::default()
        });
        assert_eq!(c.starting_cash(), DEFAULT_STARTING_CASH);
        assert_eq!(c.position_scale(), 1.0);
        assert_eq!(c.min_hold_days(), 0);
        assert_eq!(c.long_term_ratio(), 0.0);
        assert_eq!(c.long_term_min_hold_days(), 0);
    }

    #[test]
    fn record_defaults_non_finite_fields() {
        let c = SimulationConfig::from_record(&ConfigRecord {
            starting_cash: Some(f64::INFINITY),
            sell_threshold_pct: 2.5,
            buy_threshold_pct: 4.0,
            lookback_days: Some(10),
            position_scale: Some(f64::NAN),
            min_hold_days: Some(f64::NAN),
            long_term_ratio: Some(f64::NEG_INFINITY),
            long_term_min_hold_days: Some(f64::INFINITY),
        });
        assert_eq!(c.starting_cash(), DEFAULT_STARTING_CASH);
        assert_eq!(c.lookback_days(), 10);
        assert_eq!(c.position_scale(), 1.0);
        assert_eq!(c.min_hold_days(), 0);
        assert_eq!(c.long_term_ratio(), 0.0);
        assert_eq!(c.long_term_min_hold_days(), 0);
    }

    #[test]
    fn record_floors_fractional_and_negative_days() {
        let c = SimulationConfig::from_record(&ConfigRecord {
            starting_cash: Some(-50.0),
            sell_threshold_pct: 1.0,
            buy_threshold_pct: 1.0,
            min_hold_days: Some(4.9),
            long_term_min_hold_days: Some(-3.0),
            ..ConfigRecord::default()
        });
        assert_eq!(c.starting_cash(), DEFAULT_STARTING_CASH);
        assert_eq!(c.min_hold_days(), 4);
        assert_eq!(c.long_term_min_hold_days(), 0);
    }
}
