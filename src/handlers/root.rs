// handlers/root.rs - service info, health probe and the 404 fallback

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Jobly API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": crate::config::config().environment,
    }))
}

/// GET /health - 503 when the database does not answer
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" }))),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "database": "down" })),
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
