//! Runtime-configuration endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;

/// Handler for GET /api/config.
///
/// Returns the runtime Config Record when every value is present; otherwise
/// logs the omission and fails closed with an error payload. Never returns
/// a partial record.
pub async fn runtime_config(State(state): State<AppState>) -> Response {
    match state.config.runtime_config() {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "runtime configuration for the identity client is missing");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Server configuration is incomplete."
                })),
            )
                .into_response()
        }
    }
}
