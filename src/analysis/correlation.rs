//! Cross-symbol correlation of daily returns.
//!
//! Pairwise Pearson correlation over each pair's overlapping dates, plus
//! per-symbol annualized volatility. Values are rounded to 3 d.p. for
//! display; pairs with no usable overlap report 0.0.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::PriceBar;

/// Trading days per year, used to annualize daily volatility
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationAnalysis {
    /// symbol -> symbol -> Pearson correlation of daily returns
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    /// symbol -> annualized volatility of daily returns
    pub market_volatility: BTreeMap<String, f64>,
    pub symbols: Vec<String>,
}

/// Compute the correlation matrix and volatility for the given series.
pub fn correlate(series_by_symbol: &HashMap<String, Vec<PriceBar>>) -> CorrelationAnalysis {
    let mut symbols: Vec<String> = series_by_symbol.keys().cloned().collect();
    symbols.sort();

    // Date-keyed returns per symbol so pairs align on overlapping dates
    let mut returns: HashMap<&str, BTreeMap<NaiveDate, f64>> = HashMap::new();
    for (symbol, bars) in series_by_symbol {
        returns.insert(symbol.as_str(), daily_returns(bars));
    }

    let mut correlation_matrix = BTreeMap::new();
    for a in &symbols {
        let mut row = BTreeMap::new();
        for b in &symbols {
            let value = if a == b {
                1.0
            } else {
                paired_correlation(&returns[a.as_str()], &returns[b.as_str()])
            };
            row.insert(b.clone(), round3(value));
        }
        correlation_matrix.insert(a.clone(), row);
    }

    let mut market_volatility = BTreeMap::new();
    for symbol in &symbols {
        let values: Vec<f64> = returns[symbol.as_str()].values().copied().collect();
        if !values.is_empty() {
            let volatility = std_dev(&values) * TRADING_DAYS_PER_YEAR.sqrt();
            market_volatility.insert(symbol.clone(), round3(volatility));
        }
    }

    CorrelationAnalysis {
        correlation_matrix,
        market_volatility,
        symbols,
    }
}

fn daily_returns(bars: &[PriceBar]) -> BTreeMap<NaiveDate, f64> {
    let mut returns = BTreeMap::new();
    for window in bars.windows(2) {
        let prev = window[0].close;
        if prev != 0.0 {
            returns.insert(window[1].date, (window[1].close - prev) / prev);
        }
    }
    returns
}

fn paired_correlation(a: &BTreeMap<NaiveDate, f64>, b: &BTreeMap<NaiveDate, f64>) -> f64 {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (date, x) in a {
        if let Some(y) = b.get(date) {
            xs.push(*x);
            ys.push(*y);
        }
    }

    if xs.len() < 2 {
        return 0.0;
    }
    pearson(&xs, &ys)
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(start_close: f64, steps: &[f64]) -> Vec<PriceBar> {
        let mut bars = Vec::new();
        let mut close = start_close;
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        bars.push(PriceBar::new(date, close, close, close, close, 100));
        for step in steps {
            close *= 1.0 + step;
            date = date.succ_opt().unwrap();
            bars.push(PriceBar::new(date, close, close, close, close, 100));
        }
        bars
    }

    #[test]
    fn test_self_correlation_is_one() {
        let mut data = HashMap::new();
        data.insert("AAPL".to_string(), series(100.0, &[0.01, -0.02, 0.03]));
        let analysis = correlate(&data);
        assert_eq!(analysis.correlation_matrix["AAPL"]["AAPL"], 1.0);
    }

    #[test]
    fn test_identical_series_fully_correlated() {
        let steps = [0.01, -0.02, 0.03, 0.01, -0.01];
        let mut data = HashMap::new();
        data.insert("A".to_string(), series(100.0, &steps));
        data.insert("B".to_string(), series(50.0, &steps));
        let analysis = correlate(&data);
        assert_eq!(analysis.correlation_matrix["A"]["B"], 1.0);
        assert_eq!(analysis.correlation_matrix["B"]["A"], 1.0);
    }

    #[test]
    fn test_inverse_series_negatively_correlated() {
        let mut data = HashMap::new();
        data.insert("A".to_string(), series(100.0, &[0.02, -0.01, 0.03, -0.02]));
        data.insert("B".to_string(), series(100.0, &[-0.02, 0.01, -0.03, 0.02]));
        let analysis = correlate(&data);
        assert!(analysis.correlation_matrix["A"]["B"] < -0.9);
    }

    #[test]
    fn test_no_overlap_reports_zero() {
        let mut data = HashMap::new();
        data.insert("A".to_string(), series(100.0, &[0.01, 0.02]));
        let mut b = series(100.0, &[0.01, 0.02]);
        for bar in &mut b {
            bar.date = bar.date + chrono::Duration::days(365);
        }
        data.insert("B".to_string(), b);
        let analysis = correlate(&data);
        assert_eq!(analysis.correlation_matrix["A"]["B"], 0.0);
    }

    #[test]
    fn test_volatility_zero_for_constant_returns() {
        let mut data = HashMap::new();
        data.insert("A".to_string(), series(100.0, &[0.01, 0.01, 0.01]));
        let analysis = correlate(&data);
        assert_eq!(analysis.market_volatility["A"], 0.0);
    }
}
