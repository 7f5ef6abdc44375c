//! CSV file price adapter.
//!
//! Reads `<dir>/<SYMBOL>.csv`. Columns are located by header name so both
//! plain exports (`date,close`) and broker downloads (`Date,Close/Last,...`
//! with `$1,234.50` values and US dates) load.

use crate::domain::error::BiasTraderError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::PathBuf;

const DATE_HEADERS: &[&str] = &["date"];
const CLOSE_HEADERS: &[&str] = &["close", "close/last", "adj close"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_close(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse().ok()
}

impl PricePort for CsvAdapter {
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, BiasTraderError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BiasTraderError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let parse_err = |line: u64, reason: String| BiasTraderError::PriceParse {
            symbol: symbol.to_string(),
            line,
            reason,
        };
        let date_col = column(&headers, DATE_HEADERS)
            .ok_or_else(|| parse_err(1, "missing date column".into()))?;
        let close_col = column(&headers, CLOSE_HEADERS)
            .ok_or_else(|| parse_err(1, "missing close column".into()))?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let date_str = record
                .get(date_col)
                .ok_or_else(|| parse_err(line, "missing date value".into()))?;
            let date = parse_date(date_str)
                .ok_or_else(|| parse_err(line, format!("invalid date '{}'", date_str)))?;

            let close_str = record
                .get(close_col)
                .ok_or_else(|| parse_err(line, "missing close value".into()))?;
            let close = parse_close(close_str)
                .ok_or_else(|| parse_err(line, format!("invalid close '{}'", close_str)))?;
            if !(close.is_finite() && close > 0.0) {
                return Err(parse_err(line, "close must be a positive number".into()));
            }

            points.push(PricePoint { date, close });
        }

        if points.is_empty() {
            return Err(BiasTraderError::NoData {
                symbol: symbol.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        PriceSeries::new(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BiasTraderError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
