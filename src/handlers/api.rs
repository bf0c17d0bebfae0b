use std::sync::Arc;

use axum::{extract::State, http::Uri, response::Json};
use serde_json::{Value, json};

use crate::errors::AppError;
use crate::state::AppState;

/// Health check handler
/// Reports that the server is running and how many sessions are open
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "active_sessions": state.active_sessions()
    }))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {uri}"))
}
