//! Technical-analysis orchestration: series in, indicators + signal out.

pub mod composer;
pub mod correlation;
pub mod cross;
pub mod events;
pub mod indicators;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{IndicatorSet, LatestValues, PriceBar, SignalResult};

/// Complete analysis payload for one symbol
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub indicators: IndicatorSet,
    pub signal: SignalResult,
    pub latest_values: LatestValues,
    pub analysis_date: String,
    pub data_points: usize,
}

/// Orchestrates the indicator engine, cross detector and signal composer
/// over one symbol's price history.
pub struct AnalysisService;

impl AnalysisService {
    /// Run the full analysis over an ascending series.
    ///
    /// Fails with `InvalidInput` when no bars are supplied; partial
    /// indicator availability (short series) is not an error, undefined
    /// values simply cast no votes.
    pub fn analyze(symbol: &str, bars: &[PriceBar]) -> Result<Analysis> {
        if bars.is_empty() {
            return Err(Error::InvalidInput(
                "No historical data provided for analysis".to_string(),
            ));
        }

        let symbol = symbol.to_uppercase();
        info!(symbol = %symbol, data_points = bars.len(), "Generating technical analysis");

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let indicator_set = IndicatorSet {
            sma_20: indicators::sma(&closes, 20),
            sma_50: indicators::sma(&closes, 50),
            sma_200: indicators::sma(&closes, 200),
            ema_12: indicators::ema(&closes, 12),
            ema_26: indicators::ema(&closes, 26),
            rsi_14: indicators::rsi(&closes, 14),
            macd: indicators::macd(&closes, 12, 26, 9),
        };

        let signal = composer::compose(&indicator_set, bars.len());
        let latest_values = indicator_set.latest();

        info!(
            symbol = %symbol,
            verdict = ?signal.verdict,
            confidence = signal.confidence,
            "Technical analysis complete"
        );

        Ok(Analysis {
            symbol,
            indicators: indicator_set,
            signal,
            latest_values,
            analysis_date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            data_points: bars.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;
    use chrono::NaiveDate;

    fn monotone_series(count: usize) -> Vec<PriceBar> {
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut bars = Vec::new();
        for i in 0..count {
            let close = 100.0 + 2.0 * i as f64;
            bars.push(PriceBar::new(date, close, close + 1.0, close - 1.0, close, 1_000));
            date = date.succ_opt().unwrap();
        }
        bars
    }

    #[test]
    fn test_analyze_empty_is_invalid_input() {
        let err = AnalysisService::analyze("NVDA", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_analyze_uppercases_symbol() {
        let analysis = AnalysisService::analyze("nvda", &monotone_series(10)).unwrap();
        assert_eq!(analysis.symbol, "NVDA");
        assert_eq!(analysis.data_points, 10);
    }

    #[test]
    fn test_ten_bar_monotone_series_holds() {
        // 10 bars, RSI period 14: RSI undefined, no crosses possible with
        // 20/50/200 SMAs, MACD gated by the 26-bar minimum. No votes.
        let analysis = AnalysisService::analyze("NVDA", &monotone_series(10)).unwrap();

        assert!(analysis.latest_values.rsi_14.is_none());
        assert_eq!(analysis.signal.verdict, Verdict::Hold);
        assert_eq!(analysis.signal.confidence, 0.0);
        assert!(analysis.signal.reasons.is_empty());
    }

    #[test]
    fn test_monotone_series_with_short_rsi_equivalent() {
        // With >= 15 bars the RSI(14) is defined; a strictly rising series
        // pins it to 100 and casts a SELL (overbought) vote.
        let analysis = AnalysisService::analyze("NVDA", &monotone_series(16)).unwrap();

        assert_eq!(analysis.latest_values.rsi_14, Some(100.0));
        assert_eq!(analysis.signal.verdict, Verdict::Sell);
        assert!(analysis.signal.confidence > 0.0);
    }

    #[test]
    fn test_indicator_arrays_aligned_with_input() {
        let bars = monotone_series(30);
        let analysis = AnalysisService::analyze("AAPL", &bars).unwrap();

        assert_eq!(analysis.indicators.sma_20.len(), bars.len());
        assert_eq!(analysis.indicators.sma_200.len(), bars.len());
        assert_eq!(analysis.indicators.rsi_14.len(), bars.len());
        assert_eq!(analysis.indicators.macd.histogram.len(), bars.len());
    }

    #[test]
    fn test_latest_values_partial_availability() {
        // 30 bars: SMA20, RSI and MACD defined; SMA50/200 not yet
        let analysis = AnalysisService::analyze("AAPL", &monotone_series(30)).unwrap();

        assert!(analysis.latest_values.sma_20.is_some());
        assert!(analysis.latest_values.sma_50.is_none());
        assert!(analysis.latest_values.sma_200.is_none());
        assert!(analysis.latest_values.macd_line.is_some());
    }
}
