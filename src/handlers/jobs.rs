// handlers/jobs.rs - /jobs routes, including POST /jobs/apply/:jobId

use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::{query_params, RawQuery};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::models::{Job, JobApplication, JobSearch, JobUpdate, NewJob};
use crate::state::AppState;

pub(crate) fn parse_job_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("Invalid job id: {}", raw)))
}

/// POST /jobs (admin)
pub async fn create(State(state): State<AppState>, ApiJson(body): ApiJson<NewJob>) -> ApiResult<Value> {
    body.validate()?;
    let job = Job::create(&state.pool, &body).await?;
    Ok(ApiResponse::created(json!({ "job": job })))
}

/// GET /jobs?title=&minSalary=
pub async fn list(State(state): State<AppState>, query: RawQuery) -> ApiResult<Value> {
    let search = JobSearch::from_query(&query_params(query))?;
    let jobs = Job::find_all(&state.pool, &search).await?;
    Ok(ApiResponse::success(json!({ "jobs": jobs })))
}

/// GET /jobs/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let job = Job::get(&state.pool, parse_job_id(&id)?).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

/// PATCH /jobs/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<JobUpdate>,
) -> ApiResult<Value> {
    let id = parse_job_id(&id)?;
    body.validate()?;
    let job = Job::update(&state.pool, id, &body).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

/// DELETE /jobs/:id (admin)
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_job_id(&id)?;
    Job::remove(&state.pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// POST /jobs/apply/:jobId - the caller applies; repeating it is a no-op
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Value> {
    let job_id = parse_job_id(&job_id)?;
    let outcome = JobApplication::apply(&state.pool, &user.username, job_id).await?;
    Ok(ApiResponse::success(json!({ "applied": outcome.application().job_id })))
}
