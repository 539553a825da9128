use serde::Serialize;

/// MACD output: three arrays aligned with the input series
#[derive(Debug, Clone, Serialize)]
pub struct MacdSeries {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    /// All-undefined result for a series of the given length
    pub fn undefined(len: usize) -> Self {
        Self {
            macd_line: vec![None; len],
            signal_line: vec![None; len],
            histogram: vec![None; len],
        }
    }
}

/// Full indicator arrays for one analysis request.
///
/// Every vector is aligned 1:1 with the input bars; positions with
/// insufficient lookback hold `None`. Produced fresh per request, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    pub sma_20: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub sma_200: Vec<Option<f64>>,
    pub ema_12: Vec<Option<f64>>,
    pub ema_26: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub macd: MacdSeries,
}

impl IndicatorSet {
    /// Scalar values at the most recent bar, for display
    pub fn latest(&self) -> LatestValues {
        LatestValues {
            sma_20: last(&self.sma_20),
            sma_50: last(&self.sma_50),
            sma_200: last(&self.sma_200),
            rsi_14: last(&self.rsi_14),
            macd_line: last(&self.macd.macd_line),
            macd_signal: last(&self.macd.signal_line),
        }
    }
}

fn last(values: &[Option<f64>]) -> Option<f64> {
    values.last().copied().flatten()
}

/// Latest scalar value of each indicator
#[derive(Debug, Clone, Serialize)]
pub struct LatestValues {
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
}
