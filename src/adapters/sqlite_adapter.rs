//! SQLite saved-results adapter.

use crate::domain::error::BiasTraderError;
use crate::domain::saved::{SavedRecord, sort_saved};
use crate::domain::simulation::Decision;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_store_port::ResultStorePort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};

const SELECT_COLUMNS: &str = "symbol, starting_cash, sell_threshold_pct, buy_threshold_pct,
    position_scale, min_hold_days, long_term_ratio, long_term_min_hold_days,
    profit, last_decision, last_amount, last_action_price, last_price, starred, saved_on";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn storage_err<E: std::fmt::Display>(e: E) -> BiasTraderError {
    BiasTraderError::Storage {
        reason: e.to_string(),
    }
}

fn normalise(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BiasTraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BiasTraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(storage_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BiasTraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(storage_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), BiasTraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS saved_results (
                    symbol TEXT PRIMARY KEY,
                    starting_cash REAL NOT NULL,
                    sell_threshold_pct REAL NOT NULL,
                    buy_threshold_pct REAL NOT NULL,
                    position_scale REAL,
                    min_hold_days REAL,
                    long_term_ratio REAL,
                    long_term_min_hold_days REAL,
                    profit REAL NOT NULL,
                    last_decision TEXT NOT NULL,
                    last_amount INTEGER NOT NULL,
                    last_action_price REAL NOT NULL,
                    last_price REAL NOT NULL,
                    starred INTEGER NOT NULL DEFAULT 0,
                    saved_on TEXT NOT NULL
                );",
            )
            .map_err(storage_err)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, BiasTraderError> {
        self.pool.get().map_err(storage_err)
    }
}

fn text_err(len: usize, e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(len, rusqlite::types::Type::Text, e.into())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SavedRecord> {
    let decision_str: String = row.get(9)?;
    let last_decision = decision_str
        .parse::<Decision>()
        .map_err(|e| text_err(decision_str.len(), e))?;

    let date_str: String = row.get(14)?;
    let saved_on = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| text_err(date_str.len(), e))?;

    let last_amount: i64 = row.get(10)?;

    Ok(SavedRecord {
        symbol: row.get(0)?,
        starting_cash: row.get(1)?,
        sell_threshold_pct: row.get(2)?,
        buy_threshold_pct: row.get(3)?,
        position_scale: row.get(4)?,
        min_hold_days: row.get(5)?,
        long_term_ratio: row.get(6)?,
        long_term_min_hold_days: row.get(7)?,
        profit: row.get(8)?,
        last_decision,
        last_amount: u64::try_from(last_amount).unwrap_or(0),
        last_action_price: row.get(11)?,
        last_price: row.get(12)?,
        starred: row.get(13)?,
        saved_on,
    })
}

impl ResultStorePort for SqliteAdapter {
    fn save(&self, record: &SavedRecord) -> Result<(), BiasTraderError> {
        let symbol = normalise(&record.symbol);
        self.conn()?
            .execute(
                "INSERT INTO saved_results (
                    symbol, starting_cash, sell_threshold_pct, buy_threshold_pct,
                    position_scale, min_hold_days, long_term_ratio, long_term_min_hold_days,
                    profit, last_decision, last_amount, last_action_price, last_price,
                    starred, saved_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(symbol) DO UPDATE SET
                    starting_cash = excluded.starting_cash,
                    sell_threshold_pct = excluded.sell_threshold_pct,
                    buy_threshold_pct = excluded.buy_threshold_pct,
                    position_scale = excluded.position_scale,
                    min_hold_days = excluded.min_hold_days,
                    long_term_ratio = excluded.long_term_ratio,
                    long_term_min_hold_days = excluded.long_term_min_hold_days,
                    profit = excluded.profit,
                    last_decision = excluded.last_decision,
                    last_amount = excluded.last_amount,
                    last_action_price = excluded.last_action_price,
                    last_price = excluded.last_price,
                    saved_on = excluded.saved_on",
                params![
                    symbol,
                    record.starting_cash,
                    record.sell_threshold_pct,
                    record.buy_threshold_pct,
                    record.position_scale,
                    record.min_hold_days,
                    record.long_term_ratio,
                    record.long_term_min_hold_days,
                    record.profit,
                    record.last_decision.to_string(),
                    i64::try_from(record.last_amount).unwrap_or(i64::MAX),
                    record.last_action_price,
                    record.last_price,
                    record.starred,
                    record.saved_on.format("%Y-%m-%d").to_string(),
                ],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Option<SavedRecord>, BiasTraderError> {
        let conn = self.conn()?;
        let query = format!("SELECT {} FROM saved_results WHERE symbol = ?1", SELECT_COLUMNS);
        conn.query_row(&query, params![normalise(symbol)], record_from_row)
            .optional()
            .map_err(storage_err)
    }

    fn list(&self) -> Result<Vec<SavedRecord>, BiasTraderError> {
        let conn = self.conn()?;
        let query = format!("SELECT {} FROM saved_results", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&query).map_err(storage_err)?;

        let rows = stmt.query_map([], record_from_row).map_err(storage_err)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(storage_err)?);
        }

        sort_saved(&mut records);
        Ok(records)
    }

    fn remove(&self, symbol: &str) -> Result<bool, BiasTraderError> {
        let changed = self
            .conn()?
            .execute(
                "DELETE FROM saved_results WHERE symbol = ?1",
                params![normalise(symbol)],
            )
            .map_err(storage_err)?;
        Ok(changed > 0)
    }

    fn set_starred(&self, symbol: &str, starred: bool) -> Result<bool, BiasTraderError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE saved_results SET starred = ?2 WHERE symbol = ?1",
                params![normalise(symbol), starred],
            )
            .map_err(storage_err)?;
        Ok(changed > 0)
    }

    fn clear(&self) -> Result<(), BiasTraderError> {
        self.conn()?
            .execute("DELETE FROM saved_results", [])
            .map_err(storage_err)?;
        Ok(())
    }
}
