use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// `/asr-stream` is unauthenticated; put it behind a reverse proxy when the
/// deployment needs access control.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/asr-stream", get(ws::asr_stream_handler))
        .layer(TraceLayer::new_for_http())
}
