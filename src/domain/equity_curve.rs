//! Chart-ready equity curve for an already chosen configuration.

use chrono::NaiveDate;

use super::price_series::PriceSeries;
use super::sim_config::SimulationConfig;
use super::simulation::{SimulationResult, simulate};

#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub total_value: f64,
    pub shares_held: u64,
    pub cash: f64,
    /// Shares bought (positive) or sold (negative) that day.
    pub event: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    pub points: Vec<CurvePoint>,
    pub result: SimulationResult,
}

/// Re-runs the engine in trace mode and pairs each trace entry with its day.
pub fn build_trace(series: &PriceSeries, config: &SimulationConfig) -> EquityCurve {
    let mut result = simulate(series, config, true);
    let trace = result.trace.take().unwrap_or_default();

    let points = series
        .points()
        .zip(trace.total_value)
        .zip(trace.shares_held)
        .zip(trace.cash)
        .zip(trace.event)
        .map(|((((point, total_value), shares_held), cash), event)| CurvePoint {
            date: point.date,
            close: point.close,
            total_value,
            shares_held,
            cash,
            event,
        })
        .collect();

    EquityCurve { points, result }
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_value(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.total_value)
            .unwrap_or(self.result.ending_value)
    }

    pub fn buy_markers(&self) -> Vec<(NaiveDate, u64)> {
        self.points
            .iter()
            .filter(|p| p.event > 0)
            .map(|p| (p.date, p.event as u64))
            .collect()
    }

    pub fn sell_markers(&self) -> Vec<(NaiveDate, u64)> {
        self.points
            .iter()
            .filter(|p| p.event < 0)
            .map(|p| (p.date, p.event.unsigned_abs()))
            .collect()
    }

    /// Largest peak-to-trough fall of total value, in percent.
    pub fn max_drawdown_pct(&self) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut worst = 0.0_f64;
        for point in &self.points {
            peak = peak.max(point.total_value);
            if peak > 0.0 {
                worst = worst.max((peak - point.total_value) / peak * 100.0);
            }
        }
        worst
    }
}
