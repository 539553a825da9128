//! Technical indicator calculations over an ordered close-price series.
//!
//! All functions are pure: they take a slice of closes (ascending by date)
//! and return vectors aligned 1:1 with the input. Positions with
//! insufficient lookback are `None` rather than a sentinel float, so that
//! an undefined value can never leak into downstream arithmetic.

use crate::models::MacdSeries;

/// Simple Moving Average over a trailing window of `period` closes.
///
/// Positions with fewer than `period` closes available (including the
/// position itself) are `None`. A series shorter than `period` yields
/// `None` at every position.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return values;
    }

    for i in (period - 1)..closes.len() {
        let start = i + 1 - period;
        let sum: f64 = closes[start..=i].iter().sum();
        values[i] = Some(sum / period as f64);
    }

    values
}

/// Exponential Moving Average, recursive form seeded with the first close.
///
/// Smoothing factor is `2 / (period + 1)`. A series shorter than `period`
/// yields `None` everywhere; this gate is deliberately conservative (the
/// recursion could produce earlier values) to keep parity with the SMA
/// lookback contract.
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < period {
        return vec![None; closes.len()];
    }

    ema_recursive(closes, period).into_iter().map(Some).collect()
}

/// Ungated recursive EMA used internally (e.g. for the MACD signal line)
fn ema_recursive(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = match values.first() {
        Some(&first) => first,
        None => return out,
    };

    out.push(prev);
    for &value in &values[1..] {
        prev = alpha * value + (1.0 - alpha) * prev;
        out.push(prev);
    }

    out
}

/// Relative Strength Index over close-to-close deltas.
///
/// Gains and losses are averaged over a trailing window of `period`
/// deltas; values are defined from index `period` onward. When the
/// average loss in the window is exactly zero the RSI is `100.0` (the
/// limit of `100 - 100/(1+rs)` as losses vanish), which keeps the output
/// deterministic instead of relying on float division by zero.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period + 1 {
        return values;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..closes.len() {
        // Window of `period` deltas ending at bar i (delta j = bar j+1 move)
        let window = &deltas[i - period..i];
        let avg_gain: f64 =
            window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let avg_loss: f64 =
            -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

        let rsi_value = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };

        values[i] = Some(rsi_value);
    }

    values
}

/// MACD: fast EMA minus slow EMA, a signal EMA of that difference, and
/// their histogram.
///
/// If the series is shorter than `slow`, all three outputs are `None` at
/// every position; otherwise all three are defined everywhere.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    if closes.len() < slow {
        return MacdSeries::undefined(closes.len());
    }

    let ema_fast = ema_recursive(closes, fast);
    let ema_slow = ema_recursive(closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_recursive(&macd_line, signal);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd_line: macd_line.into_iter().map(Some).collect(),
        signal_line: signal_line.into_iter().map(Some).collect(),
        histogram: histogram.into_iter().map(Some).collect(),
    }
}
