//! Core domain types and logic: the simulation engine, the grid search and
//! the equity curve, plus the values they exchange.

pub mod price_series;
pub mod sim_config;
pub mod lot;
pub mod lot_book;
pub mod simulation;
pub mod grid;
pub mod progress;
pub mod optimizer;
pub mod equity_curve;
pub mod saved;
pub mod error;
