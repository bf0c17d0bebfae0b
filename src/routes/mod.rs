pub mod api;
pub mod ws;

use axum::Router;
use std::sync::Arc;

use crate::handlers::api::not_found;
use crate::state::AppState;

/// Full application router: health check, conversation socket, 404 fallback
pub fn create_app(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(ws::create_ws_router())
        .fallback(not_found)
        .with_state(state)
}
