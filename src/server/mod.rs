pub mod api;

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::store::SharedStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub started_at: Instant,
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(app_state: &AppState) -> SharedStore {
        app_state.store.clone()
    }
}

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health_handler))
        .route("/stocks/{symbol}/history", get(api::history_handler))
        .route("/stocks/{symbol}/bars", post(api::save_bars_handler))
        .route("/stocks/{symbol}/analysis", get(api::analysis_handler))
        .route("/stocks/{symbol}/events", get(api::events_handler))
        .route("/market/correlation", get(api::correlation_handler))
        .layer(cors)
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(store: SharedStore, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting stockdash server");

    tracing::info!("Registering routes:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /stocks/{{symbol}}/history");
    tracing::info!("  POST /stocks/{{symbol}}/bars");
    tracing::info!("  GET  /stocks/{{symbol}}/analysis");
    tracing::info!("  GET  /stocks/{{symbol}}/events?threshold=0.05");
    tracing::info!("  GET  /market/correlation?symbols=NVDA,AAPL");

    let app_state = AppState {
        store,
        started_at: Instant::now(),
    };
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
