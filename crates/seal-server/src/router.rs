use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router. Every method and path reaches the ingestion handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(handler::ingest_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
