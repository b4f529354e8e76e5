#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use jobly_api::config::{config, DatabaseConfig};
use jobly_api::database::DatabaseManager;
use jobly_api::server::app;
use jobly_api::state::AppState;

/// Router over a pool that never connects unless a handler reaches the store.
/// Enough for anything the route guards or payload checks decide on their own.
pub fn lazy_app() -> Router {
    let state = AppState::lazy(config()).expect("lazy pool");
    app(state, config())
}

/// Router plus pool against `DATABASE_URL`, migrated. `None` when the
/// variable is unset so store-backed tests can skip.
pub async fn db_app() -> Result<Option<(Router, PgPool)>> {
    db_app_with(config().database.clone()).await
}

/// Like `db_app`, but every request shares one pooled connection and so one
/// prepared-statement cache.
pub async fn db_app_single_connection() -> Result<Option<(Router, PgPool)>> {
    let mut database = config().database.clone();
    database.max_connections = 1;
    db_app_with(database).await
}

async fn db_app_with(database: DatabaseConfig) -> Result<Option<(Router, PgPool)>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping store-backed test");
        return Ok(None);
    }

    let pool = DatabaseManager::connect(&database)
        .await
        .context("failed to connect to DATABASE_URL")?;
    DatabaseManager::migrate(&pool).await?;

    let router = app(AppState::new(pool.clone()), config());
    Ok(Some((router, pool)))
}

pub fn token(username: &str, is_admin: bool) -> String {
    jobly_api::auth::create_token(username, is_admin).expect("token")
}

/// Handle-safe unique name, at most 25 characters
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..10])
}

/// Send one request through the router and decode the JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body from {}", uri))?
    };

    Ok((status, json))
}
