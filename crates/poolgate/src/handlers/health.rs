//! Health check endpoint for load balancers and uptime probes.

use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

/// Handler for GET /api/health.
///
/// Always returns 200 with a simple JSON body; no auth, no side effects.
pub async fn health() -> impl IntoResponse {
    tracing::debug!("health check endpoint /api/health was called");

    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().timestamp_millis(),
    }))
}
