use std::path::PathBuf;

/// Default port for the HTTP server
pub const DEFAULT_PORT: u16 = 8080;

/// Default cron expression for the daily refresh job (17:05 every weekday)
pub const DEFAULT_REFRESH_CRON: &str = "0 5 17 * * Mon-Fri";

/// Symbols refreshed by the scheduler when REFRESH_SYMBOLS is unset
pub const DEFAULT_REFRESH_SYMBOLS: &[&str] = &["NVDA", "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];

/// Number of calendar days the refresh job asks the provider for
pub const REFRESH_LOOKBACK_DAYS: u32 = 30;

/// Runtime configuration, read from environment variables with defaults
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one CSV series file per symbol
    pub data_dir: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// Symbols the scheduled refresh job keeps up to date
    pub refresh_symbols: Vec<String>,
    /// Cron expression for the refresh job
    pub refresh_cron: String,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("stock_data"));

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let refresh_symbols = std::env::var("REFRESH_SYMBOLS")
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|_| {
                DEFAULT_REFRESH_SYMBOLS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let refresh_cron =
            std::env::var("REFRESH_CRON").unwrap_or_else(|_| DEFAULT_REFRESH_CRON.to_string());

        Self {
            data_dir,
            port,
            refresh_symbols,
            refresh_cron,
        }
    }
}
