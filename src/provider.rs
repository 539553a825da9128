//! Seam for external market-data providers.
//!
//! The actual API clients live outside this crate's core; anything that
//! can produce a batch of daily bars for a symbol can feed the store.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PriceBar;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch up to `days` recent daily bars for a symbol, ascending by
    /// date. An empty vector means the provider had nothing new.
    async fn fetch_daily(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>>;
}
