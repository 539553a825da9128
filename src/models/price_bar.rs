use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One OHLCV observation for a symbol at daily granularity.
///
/// The `date` is the unique merge key within a symbol's series: saving a
/// batch that contains a date already on disk replaces the stored bar for
/// that date with the incoming one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Calendar date of the observation (merge key)
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume (0 if unknown)
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate a batch before it reaches the store: prices must be finite
    /// and non-negative, and dates unique within the batch.
    pub fn validate_batch(bars: &[PriceBar]) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(bars.len());

        for bar in bars {
            for (name, value) in [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "Invalid {} price {} on {}",
                        name, value, bar.date
                    )));
                }
            }

            if !seen.insert(bar.date) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate date {} within batch",
                    bar.date
                )));
            }
        }

        Ok(())
    }
}
