//! Grid search over [`ParameterGrid`].
//!
//! Every combination is simulated without a trace and ranked by profit
//! ratio (profit / that combination's starting cash); the first combination
//! to reach the best ratio wins ties.
//!
//! The starting-cash axis is walked in order and the search stops once
//! `stagnation_limit` consecutive cash values pass without the best ratio
//! changing. This bounds latency on large grids at the cost of completeness.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use super::error::BiasTraderError;
use super::grid::{Candidate, ParameterGrid};
use super::price_series::PriceSeries;
use super::progress::{ProgressCounter, SearchObserver};
use super::sim_config::SimulationConfig;
use super::simulation::{SimulationResult, simulate};

pub const DEFAULT_YIELD_EVERY: u64 = 400;
pub const DEFAULT_STAGNATION_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Combinations between observer checkpoints.
    pub yield_every: u64,
    /// Non-improving starting-cash values tolerated before stopping.
    pub stagnation_limit: u32,
    /// Simulate each checkpoint batch on the rayon pool.
    pub parallel: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            yield_every: DEFAULT_YIELD_EVERY,
            stagnation_limit: DEFAULT_STAGNATION_LIMIT,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchResult {
    pub result: SimulationResult,
    pub config: SimulationConfig,
    pub profit_ratio: f64,
    /// Combinations actually simulated.
    pub evaluated: u64,
    /// Size of the full grid.
    pub total: u64,
    /// True when the stagnation rule ended the search.
    pub stopped_early: bool,
}

pub fn optimize(
    series: &PriceSeries,
    grid: &ParameterGrid,
    settings: &OptimizerSettings,
    observer: &mut dyn SearchObserver,
) -> Result<GridSearchResult, BiasTraderError> {
    if series.is_empty() {
        return Err(BiasTraderError::NoResult);
    }
    let total = grid.total_combinations();
    if total == 0 {
        return Err(BiasTraderError::NoResult);
    }

    info!(
        days = series.len(),
        combinations = total,
        parallel = settings.parallel,
        "starting grid search"
    );
    let started = Instant::now();

    let candidates: Vec<Candidate> = grid.candidates().collect();
    let yield_every = settings.yield_every.max(1);
    let batch = usize::try_from(yield_every).unwrap_or(usize::MAX);

    let mut counter = ProgressCounter::new(total);
    let mut best: Option<SimulationResult> = None;
    let mut best_ratio = f64::NEG_INFINITY;
    let mut ratio_at_last_check = best_ratio;
    let mut stalled_rounds = 0u32;
    let mut stopped_early = false;

    for &starting_cash in &grid.starting_cash {
        stalled_rounds += 1;
        if stalled_rounds > settings.stagnation_limit {
            stopped_early = true;
            break;
        }
        if best_ratio != ratio_at_last_check {
            ratio_at_last_check = best_ratio;
            stalled_rounds = 0;
        }

        for chunk in candidates.chunks(batch) {
            for result in evaluate(series, grid, starting_cash, chunk, settings.parallel) {
                if let Some(percent) = counter.advance() {
                    observer.on_progress(percent);
                }

                let ratio = result.profit_ratio();
                if ratio > best_ratio {
                    debug!(
                        ratio,
                        starting_cash,
                        sell = result.config.sell_threshold_pct(),
                        buy = result.config.buy_threshold_pct(),
                        "new best"
                    );
                    best_ratio = ratio;
                    best = Some(result);
                }

                if counter.done() % yield_every == 0 && observer.checkpoint().is_break() {
                    info!(evaluated = counter.done(), "grid search cancelled");
                    return Err(BiasTraderError::Cancelled);
                }
            }
        }
    }

    if let Some(percent) = counter.finish() {
        observer.on_progress(percent);
    }

    let result = best.ok_or(BiasTraderError::NoResult)?;
    info!(
        profit_ratio = best_ratio,
        evaluated = counter.done(),
        total,
        stopped_early,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "grid search finished"
    );

    Ok(GridSearchResult {
        config: result.config,
        profit_ratio: best_ratio,
        result,
        evaluated: counter.done(),
        total,
        stopped_early,
    })
}

/// Simulates one batch; results come back in `chunk` order either way.
fn evaluate(
    series: &PriceSeries,
    grid: &ParameterGrid,
    starting_cash: f64,
    chunk: &[Candidate],
    parallel: bool,
) -> Vec<SimulationResult> {
    let run = |candidate: &Candidate| {
        simulate(series, &grid.config_for(starting_cash, candidate), false)
    };
    if parallel {
        chunk.par_iter().map(run).collect()
    } else {
        chunk.iter().map(run).collect()
    }
}
