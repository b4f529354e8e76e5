// handlers/companies.rs - /companies routes

use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::{query_params, RawQuery};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{Company, CompanySearch, CompanyUpdate, NewCompany};
use crate::state::AppState;

/// POST /companies (admin)
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewCompany>,
) -> ApiResult<Value> {
    body.validate()?;
    let company = Company::create(&state.pool, &body).await?;
    Ok(ApiResponse::created(json!({ "company": company })))
}

/// GET /companies?minEmployees=&maxEmployees=&nameLike=
pub async fn list(State(state): State<AppState>, query: RawQuery) -> ApiResult<Value> {
    let search = CompanySearch::from_query(&query_params(query))?;
    let companies = Company::find_all(&state.pool, &search).await?;
    Ok(ApiResponse::success(json!({ "companies": companies })))
}

/// GET /companies/:handle - company plus its jobs
pub async fn get(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    let company = Company::get(&state.pool, &handle).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// PATCH /companies/:handle (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    ApiJson(body): ApiJson<CompanyUpdate>,
) -> ApiResult<Value> {
    body.validate()?;
    let company = Company::update(&state.pool, &handle, &body).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// DELETE /companies/:handle (admin)
pub async fn remove(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    Company::remove(&state.pool, &handle).await?;
    Ok(ApiResponse::success(json!({ "deleted": handle })))
}
