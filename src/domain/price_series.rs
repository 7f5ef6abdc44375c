//! Daily closing-price series.

use chrono::{Duration, NaiveDate};

use super::error::BiasTraderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closes in ascending date order, index 0 being the earliest day.
///
/// Dates are unique and strictly increasing. Close values are taken as given;
/// the simulation engine copes with non-positive closes on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, BiasTraderError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(BiasTraderError::UnsortedSeries { index: index + 1 });
            }
        }
        let (dates, closes) = points.into_iter().map(|p| (p.date, p.close)).unzip();
        Ok(Self { dates, closes })
    }

    /// Builds a series over consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: Vec<f64>) -> Self {
        let dates = (0..closes.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self { dates, closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_close(&self) -> Option<f64> {
        self.closes.first().copied()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn points(&self) -> impl Iterator<Item = PricePoint> + '_ {
        self.dates
            .iter()
            .zip(&self.closes)
            .map(|(&date, &close)| PricePoint { date, close })
    }
}
