//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::trace_csv::write_trace_file;
use crate::domain::equity_curve::{EquityCurve, build_trace};
use crate::domain::error::BiasTraderError;
use crate::domain::grid::{ParameterGrid, stepped};
use crate::domain::optimizer::{
    DEFAULT_STAGNATION_LIMIT, DEFAULT_YIELD_EVERY, GridSearchResult, OptimizerSettings, optimize,
};
use crate::domain::progress::{EtaEstimator, SearchObserver};
use crate::domain::saved::SavedRecord;
use crate::domain::sim_config::DEFAULT_LOOKBACK_DAYS;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::result_store_port::ResultStorePort;

#[derive(Parser, Debug)]
#[command(name = "biastrader", about = "Threshold trading simulator and grid optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the best parameters for a symbol and save them
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Write the winning equity curve as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Search again even if a saved result exists
        #[arg(long)]
        reoptimize: bool,
        /// Evaluate combinations on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Re-run saved parameters over current prices
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List saved results, actionable first
    Saved {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Delete the saved result for a symbol
    Forget {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
    },
    /// Star (or unstar) a saved result
    Star {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        off: bool,
    },
    /// Delete every saved result
    ClearSaved {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with price files in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Optimize {
            config,
            symbol,
            output,
            reoptimize,
            parallel,
        } => run_optimize(&config, &symbol, output.as_deref(), reoptimize, parallel),
        Command::Replay {
            config,
            symbol,
            output,
        } => run_replay(&config, &symbol, output.as_deref()),
        Command::Saved { config } => run_saved(&config),
        Command::Forget { config, symbol } => run_forget(&config, &symbol),
        Command::Star {
            config,
            symbol,
            off,
        } => run_star(&config, &symbol, !off),
        Command::ClearSaved { config } => run_clear_saved(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn fail(err: &BiasTraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn whole_days(section: &str, key: &str, values: Vec<f64>) -> Result<Vec<u32>, BiasTraderError> {
    values
        .into_iter()
        .map(|v| {
            if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(BiasTraderError::ConfigInvalid {
                    section: section.into(),
                    key: key.into(),
                    reason: format!("{v} is not a whole number of days"),
                })
            }
        })
        .collect()
}

/// Reads `[grid]`; every missing key keeps the default search space.
pub fn build_grid(config: &dyn ConfigPort) -> Result<ParameterGrid, BiasTraderError> {
    let defaults = ParameterGrid::default();

    let starting_cash = stepped(
        config.get_double("grid", "cash_start", 100.0),
        config.get_double("grid", "cash_end", 10_000.0),
        config.get_double("grid", "cash_step", 100.0),
    );
    let thresholds = stepped(
        config.get_double("grid", "threshold_min", 1.0),
        config.get_double("grid", "threshold_max", 25.0),
        config.get_double("grid", "threshold_step", 0.5),
    );

    let hold_defaults: Vec<f64> = defaults.min_hold_days.iter().map(|&d| d as f64).collect();
    let lt_hold_defaults: Vec<f64> = defaults
        .long_term_min_hold_days
        .iter()
        .map(|&d| d as f64)
        .collect();

    let lookback = config.get_int("grid", "lookback_days", DEFAULT_LOOKBACK_DAYS as i64);
    let lookback_days = u32::try_from(lookback).map_err(|_| BiasTraderError::ConfigInvalid {
        section: "grid".into(),
        key: "lookback_days".into(),
        reason: format!("{lookback} is out of range"),
    })?;

    Ok(ParameterGrid {
        starting_cash,
        thresholds,
        position_scales: config.get_double_list(
            "grid",
            "position_scales",
            &defaults.position_scales,
        )?,
        min_hold_days: whole_days(
            "grid",
            "min_hold_days",
            config.get_double_list("grid", "min_hold_days", &hold_defaults)?,
        )?,
        long_term_ratios: config.get_double_list(
            "grid",
            "long_term_ratios",
            &defaults.long_term_ratios,
        )?,
        long_term_min_hold_days: whole_days(
            "grid",
            "long_term_min_hold_days",
            config.get_double_list("grid", "long_term_min_hold_days", &lt_hold_defaults)?,
        )?,
        lookback_days,
    })
}

pub fn build_optimizer_settings(config: &dyn ConfigPort) -> OptimizerSettings {
    OptimizerSettings {
        yield_every: config
            .get_int("optimizer", "yield_every", DEFAULT_YIELD_EVERY as i64)
            .max(1) as u64,
        stagnation_limit: config
            .get_int("optimizer", "stagnation_limit", DEFAULT_STAGNATION_LIMIT as i64)
            .clamp(0, u32::MAX as i64) as u32,
        parallel: config.get_bool("optimizer", "parallel", false),
    }
}

pub fn price_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

#[cfg(feature = "sqlite")]
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn ResultStorePort>, BiasTraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "sqlite"))]
pub fn open_store(_config: &dyn ConfigPort) -> Result<Box<dyn ResultStorePort>, BiasTraderError> {
    Err(BiasTraderError::Storage {
        reason: "sqlite feature is required for saved results".into(),
    })
}

/// Prints percent and an optimistic ETA to stderr.
pub struct StderrProgress {
    started: Instant,
    eta: EtaEstimator,
}

impl StderrProgress {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            eta: EtaEstimator::new(),
        }
    }
}

impl Default for StderrProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

impl SearchObserver for StderrProgress {
    fn on_progress(&mut self, percent: u8) {
        match self.eta.update(percent, self.started.elapsed()) {
            Some(remaining) => eprint!(
                "\r  Progress: {:>3}% (about {} left)   ",
                percent,
                format_duration(remaining)
            ),
            None => eprint!("\r  Progress: {:>3}%                     ", percent),
        }
        if percent >= 100 {
            eprintln!();
        }
    }
}

/// What the optimize/replay pipeline produced for one symbol.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub record: SavedRecord,
    pub curve: EquityCurve,
    /// Present when a fresh grid search ran.
    pub search: Option<GridSearchResult>,
}

/// Loads prices, then either replays the saved parameters or searches the
/// grid, and saves the refreshed record.
#[allow(clippy::too_many_arguments)]
pub fn run_optimize_pipeline(
    prices: &dyn PricePort,
    store: &dyn ResultStorePort,
    symbol: &str,
    grid: &ParameterGrid,
    settings: &OptimizerSettings,
    reoptimize: bool,
    observer: &mut dyn SearchObserver,
    today: NaiveDate,
) -> Result<PipelineOutcome, BiasTraderError> {
    let symbol = symbol.trim().to_uppercase();
    let series = prices.fetch_closes(&symbol)?;
    info!(symbol = %symbol, days = series.len(), "loaded prices");

    let saved = if reoptimize { None } else { store.load(&symbol)? };

    let (config, search, starred) = match saved {
        Some(existing) => {
            info!(symbol = %symbol, saved_on = %existing.saved_on, "replaying saved parameters");
            (existing.to_config(grid.lookback_days), None, existing.starred)
        }
        None => {
            let best = optimize(&series, grid, settings, observer)?;
            (best.config, Some(best), false)
        }
    };

    let curve = build_trace(&series, &config);
    let mut record = SavedRecord::from_result(&symbol, &curve.result, today);
    record.starred = starred;
    store.save(&record)?;

    Ok(PipelineOutcome {
        record,
        curve,
        search,
    })
}

/// Replays the saved record without searching. Fails with `NoResult` when
/// nothing is saved for the symbol.
pub fn run_replay_pipeline(
    prices: &dyn PricePort,
    store: &dyn ResultStorePort,
    symbol: &str,
    lookback_days: u32,
    today: NaiveDate,
) -> Result<PipelineOutcome, BiasTraderError> {
    let symbol = symbol.trim().to_uppercase();
    let existing = store.load(&symbol)?.ok_or(BiasTraderError::NoResult)?;
    let series = prices.fetch_closes(&symbol)?;

    let curve = build_trace(&series, &existing.to_config(lookback_days));
    let mut record = SavedRecord::from_result(&symbol, &curve.result, today);
    record.starred = existing.starred;
    store.save(&record)?;

    Ok(PipelineOutcome {
        record,
        curve,
        search: None,
    })
}

fn print_summary(outcome: &PipelineOutcome) {
    let record = &outcome.record;
    let result = &outcome.curve.result;

    eprintln!("\n=== {} ===", record.symbol);
    if let Some(search) = &outcome.search {
        eprintln!(
            "Searched:         {} of {} combinations{}",
            search.evaluated,
            search.total,
            if search.stopped_early {
                " (stopped early)"
            } else {
                ""
            }
        );
    } else {
        eprintln!("Parameters:       saved");
    }
    eprintln!("Starting Cash:    ${:.2}", record.starting_cash);
    eprintln!("Sell Threshold:   {:.2}%", record.sell_threshold_pct);
    eprintln!("Buy Threshold:    {:.2}%", record.buy_threshold_pct);
    eprintln!("Position Scale:   {:.2}", result.config.position_scale());
    eprintln!("Min Hold:         {} days", result.config.min_hold_days());
    eprintln!(
        "Long-Term:        {:.0}% held {} days",
        result.config.long_term_ratio() * 100.0,
        result.config.long_term_min_hold_days()
    );
    eprintln!("Ending Value:     ${:.2}", result.ending_value);
    eprintln!(
        "Profit:           ${:.2} ({:.2}%)",
        record.profit,
        record.profit_pct()
    );
    eprintln!("Max Drawdown:     -{:.1}%", outcome.curve.max_drawdown_pct());
    eprintln!(
        "Open Lots:        {} ({} shares)",
        result.open_lots.len(),
        result.open_shares()
    );
    if record.is_action() {
        eprintln!(
            "Last Action:      {} {} @ ${:.2}",
            record.last_decision, record.last_amount, record.last_action_price
        );
    } else {
        eprintln!("Last Action:      HOLD @ ${:.2}", record.last_price);
    }
}

fn write_output(curve: &EquityCurve, output: Option<&Path>) -> Result<(), BiasTraderError> {
    if let Some(path) = output {
        write_trace_file(curve, path)?;
        eprintln!("\nTrace written to: {}", path.display());
    }
    Ok(())
}

fn run_optimize(
    config_path: &Path,
    symbol: &str,
    output: Option<&Path>,
    reoptimize: bool,
    parallel: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let grid = match build_grid(&config) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };
    let mut settings = build_optimizer_settings(&config);
    settings.parallel |= parallel;

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let prices = price_adapter(&config);

    if reoptimize || matches!(store.load(symbol), Ok(None)) {
        eprintln!(
            "Optimizing {}: {} combinations",
            symbol.to_uppercase(),
            grid.total_combinations()
        );
    }

    let mut progress = StderrProgress::new();
    let outcome = match run_optimize_pipeline(
        &prices,
        store.as_ref(),
        symbol,
        &grid,
        &settings,
        reoptimize,
        &mut progress,
        Local::now().date_naive(),
    ) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    print_summary(&outcome);
    match write_output(&outcome.curve, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_replay(config_path: &Path, symbol: &str, output: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let lookback = config
        .get_int("grid", "lookback_days", DEFAULT_LOOKBACK_DAYS as i64)
        .clamp(0, u32::MAX as i64) as u32;

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let prices = price_adapter(&config);

    let outcome = match run_replay_pipeline(
        &prices,
        store.as_ref(),
        symbol,
        lookback,
        Local::now().date_naive(),
    ) {
        Ok(o) => o,
        Err(BiasTraderError::NoResult) => {
            eprintln!("error: no saved result for {}", symbol.to_uppercase());
            return (&BiasTraderError::NoResult).into();
        }
        Err(e) => return fail(&e),
    };

    print_summary(&outcome);
    match write_output(&outcome.curve, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_saved(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let records = match store.list() {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    if records.is_empty() {
        eprintln!("No saved results");
        return ExitCode::SUCCESS;
    }

    for r in &records {
        let action = if r.is_action() {
            format!("{} {} @ {:.2}", r.last_decision, r.last_amount, r.last_action_price)
        } else {
            "HOLD".to_string()
        };
        println!(
            "{}{:<8} {:>8.2}%  sell {:>5.2}%  buy {:>5.2}%  cash {:>9.2}  {}  ({})",
            if r.starred { "*" } else { " " },
            r.symbol,
            r.profit_pct(),
            r.sell_threshold_pct,
            r.buy_threshold_pct,
            r.starting_cash,
            action,
            r.saved_on,
        );
    }
    eprintln!("{} saved results", records.len());
    ExitCode::SUCCESS
}

fn run_forget(config_path: &Path, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match store.remove(symbol) {
        Ok(true) => {
            info!(symbol, "removed saved result");
            eprintln!("Removed {}", symbol.to_uppercase());
            ExitCode::SUCCESS
        }
        Ok(false) => {
            warn!(symbol, "no saved result to remove");
            eprintln!("No saved result for {}", symbol.to_uppercase());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_star(config_path: &Path, symbol: &str, starred: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match store.set_starred(symbol, starred) {
        Ok(true) => {
            eprintln!(
                "{} {}",
                if starred { "Starred" } else { "Unstarred" },
                symbol.to_uppercase()
            );
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("error: no saved result for {}", symbol.to_uppercase());
            (&BiasTraderError::NoResult).into()
        }
        Err(e) => fail(&e),
    }
}

fn run_clear_saved(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match store.clear() {
        Ok(()) => {
            info!("cleared saved results");
            eprintln!("Cleared saved results");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match price_adapter(&config).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
