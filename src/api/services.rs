use axum::{Json, body::Body, extract::State, response::IntoResponse};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use super::{
    error::ApiError,
    models::HealthResponse,
    sink::HttpEventSink,
    state::AppState,
    utils::{mode_label, read_body},
};

/// Relay endpoint (POST /invoke)
///
/// The body is one encoded request frame; the reply body is one encoded
/// response frame. Only envelope problems (oversized or unreadable body) are
/// reported as HTTP errors.
pub async fn invoke(
    State(state): State<AppState>,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("invoke", %request_id);

    async move {
        let limit = state.config.server.max_payload_bytes.as_usize();
        let raw = read_body(body, limit).await?;
        debug!(size = raw.len(), "Received frame");

        let mut sink = HttpEventSink::new();
        state.dispatcher.dispatch(&raw, &mut sink).await;

        debug!(size = sink.len(), "Replying with frame");
        Ok::<_, ApiError>(sink)
    }
    .instrument(span)
    .await
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: mode_label(state.config.relay.is_master).to_string(),
    })
}
