//! Composite signal generation for the latest bar.
//!
//! Aggregates SMA crossovers, RSI extremes and MACD crossovers into one
//! BUY/SELL/HOLD verdict. The tally is deterministic and order-sensitive:
//! confidence is the fraction of agreeing votes, not a statistical
//! measure, and reasons are accumulated in a fixed source order
//! (SMA 20/50, SMA 50/200, RSI, MACD).

use crate::analysis::cross::{death_cross, golden_cross};
use crate::models::{IndicatorSet, SignalResult, Verdict};

/// Crosses only count toward the signal when detected within this many
/// positions of the latest bar
const CROSS_RECENCY_WINDOW: usize = 5;

/// RSI level below which the latest bar votes BUY (oversold)
const RSI_OVERSOLD: f64 = 30.0;

/// RSI level above which the latest bar votes SELL (overbought)
const RSI_OVERBOUGHT: f64 = 70.0;

pub fn compose(indicators: &IndicatorSet, series_len: usize) -> SignalResult {
    if series_len == 0 {
        return SignalResult::hold_empty();
    }

    let latest_index = series_len - 1;
    let recent_threshold = latest_index.saturating_sub(CROSS_RECENCY_WINDOW);

    let mut buy_votes = 0u32;
    let mut sell_votes = 0u32;
    let mut reasons = Vec::new();

    // SMA cross votes: golden takes precedence over death for each pair
    for (short, long, label) in [
        (&indicators.sma_20, &indicators.sma_50, "20/50"),
        (&indicators.sma_50, &indicators.sma_200, "50/200"),
    ] {
        let golden = golden_cross(short, long).filter(|i| *i >= recent_threshold);
        let death = death_cross(short, long).filter(|i| *i >= recent_threshold);

        if golden.is_some() {
            buy_votes += 1;
            reasons.push(format!("Golden Cross ({} SMA) detected", label));
        } else if death.is_some() {
            sell_votes += 1;
            reasons.push(format!("Death Cross ({} SMA) detected", label));
        }
    }

    // RSI vote, skipped when the latest value is undefined
    if let Some(current_rsi) = indicators.rsi_14.get(latest_index).copied().flatten() {
        if current_rsi < RSI_OVERSOLD {
            buy_votes += 1;
            reasons.push(format!("RSI oversold ({:.1})", current_rsi));
        } else if current_rsi > RSI_OVERBOUGHT {
            sell_votes += 1;
            reasons.push(format!("RSI overbought ({:.1})", current_rsi));
        }
    }

    // MACD crossover vote: needs the latest and previous (line, signal)
    // pairs to both be defined
    if latest_index > 0 {
        let current = macd_pair(indicators, latest_index);
        let previous = macd_pair(indicators, latest_index - 1);

        if let (Some((macd, signal)), Some((prev_macd, prev_signal))) = (current, previous) {
            if prev_macd <= prev_signal && macd > signal {
                buy_votes += 1;
                reasons.push("MACD bullish crossover".to_string());
            } else if prev_macd >= prev_signal && macd < signal {
                sell_votes += 1;
                reasons.push("MACD bearish crossover".to_string());
            }
        }
    }

    let total = buy_votes + sell_votes;
    let (verdict, confidence) = if total == 0 {
        (Verdict::Hold, 0.0)
    } else if buy_votes > sell_votes {
        (
            Verdict::Buy,
            (buy_votes as f64 / total as f64 * 100.0).min(100.0),
        )
    } else if sell_votes > buy_votes {
        (
            Verdict::Sell,
            (sell_votes as f64 / total as f64 * 100.0).min(100.0),
        )
    } else {
        (Verdict::Hold, 50.0)
    };

    SignalResult {
        verdict,
        confidence,
        reasons,
        buy_votes,
        sell_votes,
    }
}

fn macd_pair(indicators: &IndicatorSet, index: usize) -> Option<(f64, f64)> {
    let line = indicators.macd.macd_line.get(index).copied().flatten()?;
    let signal = indicators.macd.signal_line.get(index).copied().flatten()?;
    Some((line, signal))
}
