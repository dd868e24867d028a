// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Catalogue reads, booking mutations by id, and session establishment.
// Inputs come from anonymous callers, so bodies and ids are validated here.

pub mod bookings;
pub mod products;
pub mod services;
pub mod session;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::app::AppState;

/// GET / - liveness greeting
pub async fn root() -> &'static str {
    "Hello world!"
}

/// GET /health - store connectivity check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
