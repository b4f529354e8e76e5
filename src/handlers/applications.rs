// handlers/applications.rs - /applications routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{JobApplication, NewApplication};
use crate::state::AppState;

/// POST /applications - 201 for a new application, 200 when it already existed
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewApplication>,
) -> ApiResult<Value> {
    if body.username.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }

    let outcome = JobApplication::apply(&state.pool, &body.username, body.job_id).await?;
    let status = if outcome.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let application = outcome.into_application();
    Ok(ApiResponse::with_status(json!({ "application": application }), status))
}

/// GET /applications/:username - applied jobs with company details
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Value> {
    let applications = JobApplication::get_all_for_user(&state.pool, &username).await?;
    Ok(ApiResponse::success(json!({ "applications": applications })))
}
