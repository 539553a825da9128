mod indicator_set;
mod price_bar;
mod signal;

pub use indicator_set::{IndicatorSet, LatestValues, MacdSeries};
pub use price_bar::PriceBar;
pub use signal::{SignalResult, Verdict};
