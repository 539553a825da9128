//! HTTP handlers: thin glue between the router and the core components.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analysis::correlation::{correlate, CorrelationAnalysis};
use crate::analysis::events::{detect_events, MarketEvent, DEFAULT_EVENT_THRESHOLD};
use crate::analysis::{Analysis, AnalysisService};
use crate::error::{AppError, Result};
use crate::models::PriceBar;
use crate::store::{LoadOutcome, SaveOutcome, SharedStore};

use super::AppState;

/// Events returned per request, most recent first
const MAX_EVENTS: usize = 20;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub symbols: usize,
    pub data_dir: String,
    pub current_time: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        symbols: state.store.symbol_count(),
        data_dir: state.store.data_dir().display().to_string(),
        current_time: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub records: usize,
    pub data: Vec<PriceBar>,
}

pub async fn history_handler(
    State(store): State<SharedStore>,
    Path(symbol): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let symbol = symbol.to_uppercase();

    match store.load(&symbol).await? {
        LoadOutcome::Series(data) => Ok(Json(HistoryResponse {
            symbol,
            records: data.len(),
            data,
        })),
        LoadOutcome::Missing => Err(AppError::NotFound(format!(
            "No persisted series for {}",
            symbol
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub symbol: String,
    pub updated: bool,
    pub records_submitted: usize,
    pub total_records: usize,
    pub message: String,
}

pub async fn save_bars_handler(
    State(store): State<SharedStore>,
    Path(symbol): Path<String>,
    Json(bars): Json<Vec<PriceBar>>,
) -> Result<Json<SaveResponse>> {
    let symbol = symbol.to_uppercase();
    let outcome = store.save(&symbol, &bars).await?;

    let response = match outcome {
        SaveOutcome::Empty => SaveResponse {
            symbol,
            updated: false,
            records_submitted: 0,
            total_records: 0,
            message: "No bars submitted - nothing to do".to_string(),
        },
        SaveOutcome::Unchanged { total } => SaveResponse {
            symbol,
            updated: false,
            records_submitted: bars.len(),
            total_records: total,
            message: format!("No changes needed - series up to date ({} total records)", total),
        },
        SaveOutcome::Updated { submitted, total } => SaveResponse {
            message: format!("Series updated: +{} records submitted, {} total", submitted, total),
            symbol,
            updated: true,
            records_submitted: submitted,
            total_records: total,
        },
    };

    Ok(Json(response))
}

pub async fn analysis_handler(
    State(store): State<SharedStore>,
    Path(symbol): Path<String>,
) -> Result<Json<Analysis>> {
    let symbol = symbol.to_uppercase();

    let bars = match store.load(&symbol).await? {
        LoadOutcome::Series(bars) => bars,
        LoadOutcome::Missing => {
            return Err(AppError::NotFound(format!(
                "No persisted series for {}",
                symbol
            )))
        }
    };

    let analysis = AnalysisService::analyze(&symbol, &bars)?;
    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Daily-return threshold as a fraction (default 0.05)
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub symbol: String,
    /// Threshold in percent
    pub threshold: f64,
    pub events: Vec<MarketEvent>,
    pub total_events: usize,
    pub analysis_date: String,
}

pub async fn events_handler(
    State(store): State<SharedStore>,
    Path(symbol): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    let symbol = symbol.to_uppercase();
    let threshold = params.threshold.unwrap_or(DEFAULT_EVENT_THRESHOLD);

    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(AppError::InvalidInput(format!(
            "Threshold must be a positive fraction, got {}",
            threshold
        )));
    }

    let bars = match store.load(&symbol).await? {
        LoadOutcome::Series(bars) => bars,
        LoadOutcome::Missing => {
            return Err(AppError::NotFound(format!(
                "No persisted series for {}",
                symbol
            )))
        }
    };

    let mut events = detect_events(&bars, threshold);
    let total_events = events.len();
    events.truncate(MAX_EVENTS);

    Ok(Json(EventsResponse {
        symbol,
        threshold: threshold * 100.0,
        events,
        total_events,
        analysis_date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CorrelationQuery {
    /// Comma-separated symbol list
    pub symbols: String,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    #[serde(flatten)]
    pub analysis: CorrelationAnalysis,
    pub analysis_date: String,
    pub message: String,
}

pub async fn correlation_handler(
    State(store): State<SharedStore>,
    Query(params): Query<CorrelationQuery>,
) -> Result<Json<CorrelationResponse>> {
    let requested: Vec<String> = params
        .symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if requested.len() < 2 {
        return Err(AppError::InvalidInput(
            "Correlation requires at least two symbols".to_string(),
        ));
    }

    let mut series_by_symbol = HashMap::new();
    for symbol in &requested {
        if let LoadOutcome::Series(bars) = store.load(symbol).await? {
            series_by_symbol.insert(symbol.clone(), bars);
        }
    }

    if series_by_symbol.len() < 2 {
        return Err(AppError::NotFound(
            "Fewer than two of the requested symbols have persisted data".to_string(),
        ));
    }

    let analysis = correlate(&series_by_symbol);
    let message = format!(
        "Correlation analysis complete for {} symbols",
        analysis.symbols.len()
    );

    Ok(Json(CorrelationResponse {
        analysis,
        analysis_date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        message,
    }))
}
