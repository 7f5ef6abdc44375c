#![allow(dead_code)]

use biastrader::domain::error::BiasTraderError;
use biastrader::domain::grid::ParameterGrid;
pub use biastrader::domain::price_series::PriceSeries;
use biastrader::domain::saved::{SavedRecord, sort_saved};
use biastrader::ports::price_port::PricePort;
use biastrader::ports::result_store_port::ResultStorePort;
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct MockPricePort {
    pub data: HashMap<String, PriceSeries>,
    pub fetches: Cell<usize>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.data.insert(symbol.to_string(), series(closes));
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, BiasTraderError> {
        self.fetches.set(self.fetches.get() + 1);
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| BiasTraderError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, BiasTraderError> {
        let mut symbols: Vec<_> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// In-memory saved-results store with the same overwrite rules as SQLite.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, SavedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStorePort for MemoryStore {
    fn save(&self, record: &SavedRecord) -> Result<(), BiasTraderError> {
        let key = record.symbol.trim().to_uppercase();
        let mut records = self.records.borrow_mut();
        let starred = records.get(&key).map(|r| r.starred).unwrap_or(record.starred);
        let mut stored = record.clone();
        stored.symbol = key.clone();
        stored.starred = starred;
        records.insert(key, stored);
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Option<SavedRecord>, BiasTraderError> {
        Ok(self
            .records
            .borrow()
            .get(&symbol.trim().to_uppercase())
            .cloned())
    }

    fn list(&self) -> Result<Vec<SavedRecord>, BiasTraderError> {
        let mut records: Vec<_> = self.records.borrow().values().cloned().collect();
        sort_saved(&mut records);
        Ok(records)
    }

    fn remove(&self, symbol: &str) -> Result<bool, BiasTraderError> {
        Ok(self
            .records
            .borrow_mut()
            .remove(&symbol.trim().to_uppercase())
            .is_some())
    }

    fn set_starred(&self, symbol: &str, starred: bool) -> Result<bool, BiasTraderError> {
        match self
            .records
            .borrow_mut()
            .get_mut(&symbol.trim().to_uppercase())
        {
            Some(record) => {
                record.starred = starred;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> Result<(), BiasTraderError> {
        self.records.borrow_mut().clear();
        Ok(())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes(date("2024-01-01"), closes.to_vec())
}

/// Oscillating closes with a slow upward drift.
pub fn wavy(days: usize) -> Vec<f64> {
    (0..days)
        .map(|i| {
            let t = i as f64;
            100.0 + t * 0.2 + 12.0 * (t / 3.0).sin()
        })
        .collect()
}

pub fn small_grid() -> ParameterGrid {
    ParameterGrid {
        starting_cash: vec![1000.0, 2000.0, 3000.0],
        thresholds: vec![2.0, 4.0, 8.0],
        position_scales: vec![0.5, 1.0],
        min_hold_days: vec![0, 2],
        long_term_ratios: vec![0.0, 0.5],
        long_term_min_hold_days: vec![0, 5],
        lookback_days: 30,
    }
}
