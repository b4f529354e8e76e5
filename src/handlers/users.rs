// handlers/users.rs - /users routes
//
// POST and GET /users are admin-only; the /users/:username routes are open to
// that user and to admins.

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::auth::create_token;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{NewUser, User, UserUpdate};
use crate::state::AppState;

/// POST /users - admin creates a user (optionally an admin) and gets a token for it
pub async fn create(State(state): State<AppState>, ApiJson(body): ApiJson<NewUser>) -> ApiResult<Value> {
    body.validate()?;
    let user = User::register(&state.pool, &body).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::created(json!({ "user": user, "token": token })))
}

/// GET /users
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let users = User::find_all(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// GET /users/:username - includes applied job ids
pub async fn get(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    let user = User::get(&state.pool, &username).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PATCH /users/:username
pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> ApiResult<Value> {
    body.validate()?;
    let user = User::update(&state.pool, &username, &body).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// DELETE /users/:username
pub async fn remove(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    User::remove(&state.pool, &username).await?;
    Ok(ApiResponse::success(json!({ "deleted": username })))
}
