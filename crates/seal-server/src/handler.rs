use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use seal_node::{IntakeError, IntakeHandle, TipView};
use seal_types::Entry;
use tracing::debug;

/// Shared state of the ingestion endpoint.
#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeHandle,
    pub tip: Arc<TipView>,
}

/// Accept one entry: the request path without its leading `/`,
/// percent-decoded to raw bytes. The decoded bytes need not be UTF-8.
///
/// The reported block number is read after the entry is queued and may not
/// be the block that will contain it.
pub async fn ingest_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let raw = path.strip_prefix('/').unwrap_or(path);
    debug!(path = raw, "ingest");
    let entry: Vec<u8> = percent_decode_str(raw).collect();

    match state.intake.submit(Entry::from(entry)).await {
        Ok(()) => (
            StatusCode::OK,
            format!("Block Number is {}\n", state.tip.block_number()),
        )
            .into_response(),
        Err(IntakeError::LineBreak) => {
            (StatusCode::BAD_REQUEST, "entry contains a line break\n").into_response()
        }
        Err(IntakeError::Closed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "block assembler is not running\n",
        )
            .into_response(),
    }
}
