//! Significant price-move detection.
//!
//! Scans day-over-day returns and reports every move whose magnitude
//! meets the configured threshold, tiered into "Significant" and
//! "Extreme" (more than twice the threshold).

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::PriceBar;

/// Default daily-return threshold (5%)
pub const DEFAULT_EVENT_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "Large Move Up")]
    LargeMoveUp,
    #[serde(rename = "Large Move Down")]
    LargeMoveDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Magnitude {
    Significant,
    Extreme,
}

/// One qualifying price move
#[derive(Debug, Clone, Serialize)]
pub struct MarketEvent {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub magnitude: Magnitude,
    /// Day-over-day return in percent, 2 d.p.
    pub return_pct: f64,
    pub price_from: f64,
    pub price_to: f64,
    pub volume: u64,
}

/// Detect events over an ascending series, returned most recent first.
pub fn detect_events(bars: &[PriceBar], threshold: f64) -> Vec<MarketEvent> {
    let mut events = Vec::new();

    for window in bars.windows(2) {
        let prev_close = window[0].close;
        let current = &window[1];

        if prev_close == 0.0 {
            continue;
        }
        let daily_return = (current.close - prev_close) / prev_close;

        if daily_return.abs() >= threshold {
            let kind = if daily_return > 0.0 {
                EventKind::LargeMoveUp
            } else {
                EventKind::LargeMoveDown
            };
            let magnitude = if daily_return.abs() > threshold * 2.0 {
                Magnitude::Extreme
            } else {
                Magnitude::Significant
            };

            events.push(MarketEvent {
                date: current.date,
                kind,
                magnitude,
                return_pct: (daily_return * 100.0 * 100.0).round() / 100.0,
                price_from: (prev_close * 100.0).round() / 100.0,
                price_to: (current.close * 100.0).round() / 100.0,
                volume: current.volume,
            });
        }
    }

    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
}
