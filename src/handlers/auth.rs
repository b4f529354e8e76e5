// handlers/auth.rs - POST /auth/token and POST /auth/register

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::create_token;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{FieldErrors, NewUser, Registration, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

impl TokenRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length("username", &self.username, 1, 25)
            .length("password", &self.password, 1, 20)
            .finish("Invalid login")
    }
}

/// POST /auth/token - exchange username/password for a token
pub async fn token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> ApiResult<Value> {
    body.validate()?;

    let user = User::authenticate(&state.pool, &body.username, &body.password).await?;
    let token = create_token(&user.username, user.is_admin)?;

    Ok(ApiResponse::success(json!({ "token": token })))
}

/// POST /auth/register - self sign-up; never grants admin
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Registration>,
) -> ApiResult<Value> {
    let new_user = NewUser::from(body);
    new_user.validate()?;

    let user = User::register(&state.pool, &new_user).await?;
    let token = create_token(&user.username, user.is_admin)?;

    Ok(ApiResponse::created(json!({ "token": token })))
}
