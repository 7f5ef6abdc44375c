//! Progress reporting for long searches.
//!
//! All state here is owned by the caller of the optimizer; nothing is global.

use std::ops::ControlFlow;
use std::time::Duration;

/// Receives the optimizer's progress stream and checkpoints.
pub trait SearchObserver {
    /// Called with a non-decreasing, deduplicated percent; the last call is 100.
    fn on_progress(&mut self, percent: u8);

    /// Called every fixed batch of combinations. Returning `Break` cancels
    /// the search. The default hands the thread back to the scheduler.
    fn checkpoint(&mut self) -> ControlFlow<()> {
        std::thread::yield_now();
        ControlFlow::Continue(())
    }
}

/// Observer that ignores progress and never cancels.
#[derive(Debug, Default)]
pub struct Silent;

impl SearchObserver for Silent {
    fn on_progress(&mut self, _percent: u8) {}
}

impl<F: FnMut(u8)> SearchObserver for F {
    fn on_progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Turns a completed-count into integer percents, emitting each value once.
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    total: u64,
    done: u64,
    last_emitted: Option<u8>,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        ProgressCounter {
            total,
            done: 0,
            last_emitted: None,
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    /// Counts one completed item; returns the new percent if it changed.
    pub fn advance(&mut self) -> Option<u8> {
        self.done += 1;
        let percent = if self.total == 0 {
            100
        } else {
            ((self.done.min(self.total) * 100) / self.total) as u8
        };
        self.emit(percent)
    }

    /// Returns 100 unless it has already been emitted.
    pub fn finish(&mut self) -> Option<u8> {
        self.emit(100)
    }

    fn emit(&mut self, percent: u8) -> Option<u8> {
        if self.last_emitted == Some(percent) {
            return None;
        }
        self.last_emitted = Some(percent);
        Some(percent)
    }
}

/// Optimistic remaining-time estimate.
///
/// The estimator assumes the search will end around 15% (the stagnation
/// exit usually fires early) and moves the target up in 5% steps whenever
/// progress passes it. The rate comes from the most recent progress step.
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    target_percent: u8,
    last: Option<(u8, Duration)>,
    remaining: Option<Duration>,
}

const INITIAL_TARGET_PERCENT: u8 = 15;
const TARGET_STEP_PERCENT: u8 = 5;

impl Default for EtaEstimator {
    fn default() -> Self {
        EtaEstimator {
            target_percent: INITIAL_TARGET_PERCENT,
            last: None,
            remaining: None,
        }
    }
}

impl EtaEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_percent(&self) -> u8 {
        self.target_percent
    }

    /// Feeds a progress value observed `elapsed` after the search started.
    pub fn update(&mut self, percent: u8, elapsed: Duration) -> Option<Duration> {
        let percent = percent.min(100);
        if percent == 0 || percent >= 100 {
            self.reset(percent, elapsed);
            return None;
        }

        while percent > self.target_percent && self.target_percent < 100 {
            self.target_percent = (self.target_percent + TARGET_STEP_PERCENT).min(100);
        }

        if let Some((last_percent, last_elapsed)) = self.last {
            if percent > last_percent && elapsed > last_elapsed {
                let per_percent = (elapsed - last_elapsed) / u32::from(percent - last_percent);
                let remaining_percent = self.target_percent.saturating_sub(percent).max(1);
                self.remaining = Some(per_percent * u32::from(remaining_percent));
            }
        }

        self.last = Some((percent, elapsed));
        self.remaining
    }

    fn reset(&mut self, percent: u8, elapsed: Duration) {
        self.target_percent = INITIAL_TARGET_PERCENT;
        self.last = Some((percent, elapsed));
        self.remaining = None;
    }
}
