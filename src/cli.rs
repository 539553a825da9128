use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::Config;
use crate::provider::QuoteProvider;
use crate::scheduler::RefreshScheduler;
use crate::store::{LoadOutcome, TimeSeriesStore};

#[derive(Parser)]
#[command(name = "stockdash")]
#[command(about = "Stock dashboard backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Show persisted series status
    Status,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Serve => serve(config, None).await,
        Commands::Status => status(config).await,
    }
}

/// Run the server, with the scheduled refresh wired up when a quote
/// provider is supplied. Provider clients live outside this crate; with
/// none configured the API still serves whatever has been saved.
async fn serve(
    config: Config,
    provider: Option<Arc<dyn QuoteProvider>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(TimeSeriesStore::new(config.data_dir.clone()));

    let mut scheduler = None;
    match provider {
        Some(provider) => {
            let sched = RefreshScheduler::new().await?;
            sched
                .register_refresh_job(
                    &config.refresh_cron,
                    store.clone(),
                    provider,
                    config.refresh_symbols.clone(),
                )
                .await?;
            sched.start().await?;
            scheduler = Some(sched);
        }
        None => {
            tracing::info!("No quote provider configured - scheduled refresh disabled");
        }
    }

    let result = crate::server::serve(store, config.port).await;

    if let Some(mut sched) = scheduler {
        sched.shutdown().await?;
    }

    result
}

async fn status(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = TimeSeriesStore::new(config.data_dir.clone());

    println!("Data directory: {}", config.data_dir.display());

    let mut symbols: Vec<String> = std::fs::read_dir(&config.data_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| {
                    let path = e.path();
                    if path.extension().map(|ext| ext == "csv").unwrap_or(false) {
                        path.file_stem().and_then(|s| s.to_str()).map(String::from)
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    symbols.sort();

    if symbols.is_empty() {
        println!("No persisted series found");
        return Ok(());
    }

    for symbol in symbols {
        match store.load(&symbol).await? {
            LoadOutcome::Series(bars) => {
                let range = match (bars.first(), bars.last()) {
                    (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
                    _ => "empty".to_string(),
                };
                println!("{:8} {:6} records  {}", symbol, bars.len(), range);
            }
            LoadOutcome::Missing => {
                println!("{:8} missing", symbol);
            }
        }
    }

    Ok(())
}
