//! Scheduled data refresh.
//!
//! Owns a set of (cron expression, job) registrations and runs them
//! against injected collaborators: the quote provider supplies fresh
//! bars, the store merges them. No global state; the serve command
//! creates, starts and shuts the scheduler down with the server
//! lifecycle.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::config::REFRESH_LOOKBACK_DAYS;
use crate::error::{Error, Result};
use crate::provider::QuoteProvider;
use crate::store::{SaveOutcome, SharedStore};

/// Counters for one refresh pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshStats {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

pub struct RefreshScheduler {
    scheduler: JobScheduler,
}

impl RefreshScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| Error::Config(format!("Failed to create scheduler: {}", e)))?;
        Ok(Self { scheduler })
    }

    /// Register the daily refresh job under the given cron expression.
    pub async fn register_refresh_job(
        &self,
        cron: &str,
        store: SharedStore,
        provider: Arc<dyn QuoteProvider>,
        symbols: Vec<String>,
    ) -> Result<()> {
        let symbols = Arc::new(symbols);

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let store = store.clone();
            let provider = provider.clone();
            let symbols = symbols.clone();
            Box::pin(async move {
                let stats = run_refresh(&store, provider.as_ref(), &symbols).await;
                info!(
                    updated = stats.updated,
                    unchanged = stats.unchanged,
                    failed = stats.failed,
                    "Scheduled refresh pass complete"
                );
            })
        })
        .map_err(|e| Error::Config(format!("Invalid cron expression '{}': {}", cron, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| Error::Config(format!("Failed to register job: {}", e)))?;

        info!(cron = cron, "Registered refresh job");
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| Error::Config(format!("Failed to start scheduler: {}", e)))
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| Error::Config(format!("Failed to shut down scheduler: {}", e)))
    }
}

/// One refresh pass over the configured symbols.
///
/// Per-symbol failures are logged and counted, never fatal to the pass.
pub async fn run_refresh(
    store: &SharedStore,
    provider: &dyn QuoteProvider,
    symbols: &[String],
) -> RefreshStats {
    let mut stats = RefreshStats::default();

    for symbol in symbols {
        let bars = match provider.fetch_daily(symbol, REFRESH_LOOKBACK_DAYS).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Refresh fetch failed");
                stats.failed += 1;
                continue;
            }
        };

        match store.save(symbol, &bars).await {
            Ok(SaveOutcome::Updated { submitted, total }) => {
                info!(symbol = %symbol, submitted, total, "Refresh saved");
                stats.updated += 1;
            }
            Ok(SaveOutcome::Unchanged { total }) => {
                info!(symbol = %symbol, total, "Refresh found no changes");
                stats.unchanged += 1;
            }
            Ok(SaveOutcome::Empty) => {
                info!(symbol = %symbol, "Provider returned no bars");
                stats.unchanged += 1;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Refresh save failed");
                stats.failed += 1;
            }
        }
    }

    stats
}
