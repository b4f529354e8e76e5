//! Route authorization.
//!
//! `authenticate` runs on every request and only records who the caller is.
//! Each route then declares the checks it needs as independent predicates
//! (`ensure_logged_in`, `ensure_admin`, `ensure_self_or_admin`), attached with
//! `route_layer`. Public routes declare none.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from the JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Record the caller if a valid bearer token is present. Never rejects: a
/// missing or bad token just leaves the request anonymous.
pub async fn authenticate(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_jwt_from_headers(&headers) {
        match auth::verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(e) => tracing::debug!("Ignoring bearer token: {}", e),
        }
    }

    next.run(request).await
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub fn ensure_logged_in(user: Option<&AuthUser>) -> Result<&AuthUser, ApiError> {
    user.ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

pub fn ensure_admin(user: Option<&AuthUser>) -> Result<&AuthUser, ApiError> {
    let user = ensure_logged_in(user)?;
    if !user.is_admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(user)
}

/// Caller must be the target user or an admin
pub fn ensure_self_or_admin<'a>(
    user: Option<&'a AuthUser>,
    target_username: &str,
) -> Result<&'a AuthUser, ApiError> {
    let user = ensure_logged_in(user)?;
    if !user.is_admin && user.username != target_username {
        return Err(ApiError::forbidden(format!(
            "User '{}' may not act on '{}'",
            user.username, target_username
        )));
    }
    Ok(user)
}

pub async fn require_logged_in(request: Request, next: Next) -> Response {
    match ensure_logged_in(request.extensions().get::<AuthUser>()) {
        Ok(_) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

pub async fn require_admin(request: Request, next: Next) -> Response {
    match ensure_admin(request.extensions().get::<AuthUser>()) {
        Ok(_) => next.run(request).await,
        Err(e) => {
            tracing::warn!("Admin route {} denied: {}", request.uri().path(), e);
            e.into_response()
        }
    }
}

/// Guard for routes with a `:username` path segment
pub async fn require_self_or_admin(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(target) = params.get("username") else {
        return ApiError::internal_server_error("Route has no username parameter").into_response();
    };

    match ensure_self_or_admin(request.extensions().get::<AuthUser>(), target) {
        Ok(_) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Handlers that need the caller take `AuthUser` directly
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        ensure_logged_in(parts.extensions.get::<AuthUser>()).cloned()
    }
}
