//! Durable per-symbol OHLCV storage with merge-on-date semantics.
//!
//! One CSV file per symbol under the data directory. A save merges the
//! incoming batch into the persisted series, with the incoming batch
//! winning for any overlapping date, so callers can push corrected or
//! refreshed ranges without an update-vs-insert decision. A save whose
//! merged result is row-for-row identical to what is already on disk is
//! reported as unchanged and skips the rewrite.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::PriceBar;

pub type SharedStore = Arc<TimeSeriesStore>;

/// Outcome of a save operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Empty input batch: nothing to do, not an error
    Empty,
    /// Merged series matched the persisted one; no rewrite happened
    Unchanged { total: usize },
    /// Series persisted
    Updated { submitted: usize, total: usize },
}

/// Outcome of a load operation
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Full persisted series, ascending by date
    Series(Vec<PriceBar>),
    /// No series has ever been saved for this symbol
    Missing,
}

pub struct TimeSeriesStore {
    data_dir: PathBuf,
    /// Per-symbol locks serializing the read-merge-write sequence.
    /// Saves for different symbols proceed in parallel. Entries are
    /// never evicted; the symbol universe is small and bounded.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TimeSeriesStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Number of symbols with a persisted series
    pub fn symbol_count(&self) -> usize {
        std::fs::read_dir(&self.data_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.path().extension().map(|ext| ext == "csv").unwrap_or(false)
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    /// Merge-save a batch of bars for one symbol.
    ///
    /// The batch may arrive unordered; the persisted series is always
    /// sorted ascending by date. Intra-batch duplicate dates are rejected
    /// as invalid input before anything is read or written.
    pub async fn save(&self, symbol: &str, bars: &[PriceBar]) -> Result<SaveOutcome> {
        if bars.is_empty() {
            return Ok(SaveOutcome::Empty);
        }

        let symbol = normalize_symbol(symbol)?;
        PriceBar::validate_batch(bars)?;

        let lock = self.symbol_lock(&symbol).await;
        let _guard = lock.lock().await;

        let path = self.series_path(&symbol);
        let existing = if path.exists() {
            read_series(&path)?
        } else {
            Vec::new()
        };

        let incoming_dates: HashSet<_> = bars.iter().map(|b| b.date).collect();
        let mut merged: Vec<PriceBar> = existing
            .iter()
            .filter(|b| !incoming_dates.contains(&b.date))
            .cloned()
            .collect();
        merged.extend(bars.iter().cloned());
        merged.sort_by_key(|b| b.date);

        if merged == existing {
            debug!(symbol = %symbol, total = existing.len(), "Series unchanged, skipping rewrite");
            return Ok(SaveOutcome::Unchanged {
                total: existing.len(),
            });
        }

        write_series_atomic(&self.data_dir, &path, &merged)?;

        info!(
            symbol = %symbol,
            submitted = bars.len(),
            total = merged.len(),
            "Series saved"
        );

        Ok(SaveOutcome::Updated {
            submitted: bars.len(),
            total: merged.len(),
        })
    }

    /// Load the full persisted series for a symbol.
    pub async fn load(&self, symbol: &str) -> Result<LoadOutcome> {
        let symbol = normalize_symbol(symbol)?;
        let path = self.series_path(&symbol);

        if !path.exists() {
            return Ok(LoadOutcome::Missing);
        }

        Ok(LoadOutcome::Series(read_series(&path)?))
    }

    fn series_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol))
    }

    async fn symbol_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Uppercase the symbol and reject anything that could escape the data
/// directory or produce a surprising filename.
fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();

    if symbol.is_empty() {
        return Err(Error::InvalidInput("Empty symbol".to_string()));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(Error::InvalidInput(format!("Invalid symbol: {}", symbol)));
    }

    Ok(symbol)
}

fn read_series(path: &Path) -> Result<Vec<PriceBar>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        // Corruption of an already-persisted file is the server's fault,
        // not the caller's
        let bar: PriceBar = result
            .map_err(|e| Error::Storage(format!("Corrupt record in {}: {}", path.display(), e)))?;
        bars.push(bar);
    }

    Ok(bars)
}

/// Write the series to a temp file in the same directory, then rename it
/// over the target. A failed write leaves the previously persisted series
/// intact.
fn write_series_atomic(data_dir: &Path, path: &Path, bars: &[PriceBar]) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| Error::Storage(format!("Failed to create data dir: {}", e)))?;

    let tmp_path = path.with_extension("csv.tmp");

    let write_result = (|| -> Result<()> {
        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", tmp_path.display(), e)))?;
        for bar in bars {
            writer
                .serialize(bar)
                .map_err(|e| Error::Storage(format!("Failed to write record: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| Error::Storage(format!("Failed to flush {}: {}", tmp_path.display(), e)))?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Storage(format!("Failed to replace {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar::new(
            date.parse().unwrap(),
            close - 1.0,
            close + 1.0,
            close - 2.0,
            close,
            10_000,
        )
    }

    fn store() -> (tempfile::TempDir, TimeSeriesStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TimeSeriesStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_new_symbol_sorts_and_persists() {
        let (_dir, store) = store();
        let bars = vec![bar("2025-01-03", 103.0), bar("2025-01-01", 101.0)];

        let outcome = store.save("nvda", &bars).await.unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Updated {
                submitted: 2,
                total: 2
            }
        );

        match store.load("NVDA").await.unwrap() {
            LoadOutcome::Series(series) => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].date, "2025-01-01".parse::<NaiveDate>().unwrap());
                assert_eq!(series[1].date, "2025-01-03".parse::<NaiveDate>().unwrap());
            }
            LoadOutcome::Missing => panic!("series should exist"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (_dir, store) = store();
        assert_eq!(store.save("NVDA", &[]).await.unwrap(), SaveOutcome::Empty);
        assert_eq!(store.load("NVDA").await.unwrap(), LoadOutcome::Missing);
    }

    #[tokio::test]
    async fn test_repeated_save_is_unchanged() {
        let (_dir, store) = store();
        let bars = vec![bar("2025-01-01", 101.0), bar("2025-01-02", 102.0)];

        store.save("NVDA", &bars).await.unwrap();
        let second = store.save("NVDA", &bars).await.unwrap();
        assert_eq!(second, SaveOutcome::Unchanged { total: 2 });
    }

    #[tokio::test]
    async fn test_merge_overlap_favors_incoming() {
        let (_dir, store) = store();
        let old = vec![
            bar("2025-01-01", 101.0),
            bar("2025-01-02", 102.0),
            bar("2025-01-03", 103.0),
        ];
        store.save("NVDA", &old).await.unwrap();

        // Overlaps 01-02 and 01-03 with corrected closes, adds 01-04
        let new = vec![
            bar("2025-01-02", 95.0),
            bar("2025-01-03", 96.0),
            bar("2025-01-04", 97.0),
        ];
        let outcome = store.save("NVDA", &new).await.unwrap();

        // len(old) + len(new) - overlap = 3 + 3 - 2
        assert_eq!(
            outcome,
            SaveOutcome::Updated {
                submitted: 3,
                total: 4
            }
        );

        match store.load("NVDA").await.unwrap() {
            LoadOutcome::Series(series) => {
                assert_eq!(series.len(), 4);
                assert_eq!(series[1].close, 95.0);
                assert_eq!(series[2].close, 96.0);
                assert_eq!(series[3].close, 97.0);
            }
            LoadOutcome::Missing => panic!("series should exist"),
        }
    }

    #[tokio::test]
    async fn test_intra_batch_duplicate_dates_rejected() {
        let (_dir, store) = store();
        let bars = vec![bar("2025-01-01", 101.0), bar("2025-01-01", 102.0)];
        let err = store.save("NVDA", &bars).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.load("NVDA").await.unwrap(), LoadOutcome::Missing);
    }

    #[tokio::test]
    async fn test_symbol_is_case_insensitive() {
        let (_dir, store) = store();
        store.save("nvda", &[bar("2025-01-01", 101.0)]).await.unwrap();
        assert!(matches!(
            store.load("NvDa").await.unwrap(),
            LoadOutcome::Series(_)
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_symbol_rejected() {
        let (_dir, store) = store();
        let err = store.save("../evil", &[bar("2025-01-01", 1.0)]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_saves_both_survive() {
        let (_dir, store) = store();
        let store = Arc::new(store);

        let early: Vec<PriceBar> = (1..=5).map(|d| bar(&format!("2025-01-0{}", d), 100.0)).collect();
        let late: Vec<PriceBar> = (1..=5).map(|d| bar(&format!("2025-02-0{}", d), 200.0)).collect();

        let s1 = store.clone();
        let s2 = store.clone();
        let e = early.clone();
        let l = late.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.save("NVDA", &e).await }),
            tokio::spawn(async move { s2.save("NVDA", &l).await }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        match store.load("NVDA").await.unwrap() {
            LoadOutcome::Series(series) => {
                assert_eq!(series.len(), 10);
                // Ascending across both ranges, no lost update
                assert!(series.windows(2).all(|w| w[0].date < w[1].date));
            }
            LoadOutcome::Missing => panic!("series should exist"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_persisted_file_is_storage_error() {
        let (dir, store) = store();
        std::fs::write(
            dir.path().join("NVDA.csv"),
            "date,open,high,low,close,volume\n2025-01-01,a,b,c,d,e\n",
        )
        .unwrap();

        // Corruption of a persisted file is a server fault, not bad input
        let err = store.load("NVDA").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_prior_series_intact() {
        let (dir, store) = store();
        let original = vec![bar("2025-01-01", 101.0), bar("2025-01-02", 102.0)];
        store.save("NVDA", &original).await.unwrap();

        // Occupy the temp path with a directory so the swap write fails
        std::fs::create_dir(dir.path().join("NVDA.csv.tmp")).unwrap();

        let err = store
            .save("NVDA", &[bar("2025-01-03", 999.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        match store.load("NVDA").await.unwrap() {
            LoadOutcome::Series(series) => {
                assert_eq!(series, original);
            }
            LoadOutcome::Missing => panic!("series should exist"),
        }
    }

    #[tokio::test]
    async fn test_symbol_count() {
        let (_dir, store) = store();
        assert_eq!(store.symbol_count(), 0);
        store.save("NVDA", &[bar("2025-01-01", 100.0)]).await.unwrap();
        store.save("AAPL", &[bar("2025-01-01", 100.0)]).await.unwrap();
        assert_eq!(store.symbol_count(), 2);
    }
}
