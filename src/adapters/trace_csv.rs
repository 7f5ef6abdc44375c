//! Equity curve export as CSV.

use crate::domain::equity_curve::EquityCurve;
use crate::domain::error::BiasTraderError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = ["date", "close", "total_value", "shares_held", "cash", "event"];

/// Writes one row per simulated day.
pub fn write_trace<W: Write>(curve: &EquityCurve, writer: W) -> Result<(), BiasTraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for point in &curve.points {
        wtr.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.close),
            format!("{:.2}", point.total_value),
            point.shares_held.to_string(),
            format!("{:.2}", point.cash),
            point.event.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_trace_file(curve: &EquityCurve, path: &Path) -> Result<(), BiasTraderError> {
    write_trace(curve, File::create(path)?)
}
