mod series_store;

pub use series_store::{LoadOutcome, SaveOutcome, SharedStore, TimeSeriesStore};
