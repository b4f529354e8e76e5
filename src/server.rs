// server.rs - router assembly and the listen loop
//
// Every request passes `authenticate` first. Each route group then carries
// its own guard via `route_layer`, so a guard only runs on matched routes and
// unknown paths fall through to the JSON 404.

use axum::{
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{applications, auth, companies, jobs, root, users};
use crate::middleware::{authenticate, require_admin, require_logged_in, require_self_or_admin};
use crate::state::AppState;

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(root::health))
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
        .route("/companies", get(companies::list))
        .route("/companies/:handle", get(companies::get))
        .route("/jobs", get(jobs::list))
        .route("/jobs/:id", get(jobs::get))
        .route("/applications", post(applications::create))
        .route("/applications/:username", get(applications::list_for_user))
}

fn logged_in_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/apply/:jobId", post(jobs::apply))
        .route_layer(from_fn(require_logged_in))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", post(companies::create))
        .route(
            "/companies/:handle",
            patch(companies::update).delete(companies::remove),
        )
        .route("/jobs", post(jobs::create))
        .route("/jobs/:id", patch(jobs::update).delete(jobs::remove))
        .route("/users", post(users::create).get(users::list))
        .route_layer(from_fn(require_admin))
}

fn self_or_admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route_layer(from_fn(require_self_or_admin))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

/// The complete application router
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = public_routes()
        .merge(logged_in_routes())
        .merge(admin_routes())
        .merge(self_or_admin_routes())
        .fallback(root::not_found)
        .layer(from_fn(authenticate))
        .layer(cors_layer(&config.security.cors_origins));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn listen(state: AppState, config: &AppConfig, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Jobly API listening on http://{}", bind_addr);
    axum::serve(listener, app(state, config)).await?;
    Ok(())
}
