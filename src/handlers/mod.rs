// handlers/mod.rs - HTTP surface
//
// Route groups:
//   Public    GET  /            service index (name, version, procedures)
//             GET  /health      liveness + store reachability
//   Auth      POST /auth/callback   provider profile -> session token
//             GET  /auth/session    current session or null
//   Assets    POST /api/assets      records an uploaded image URL
//   RPC       GET|POST /rpc/:procedure   the procedure registry
//
// Session resolution runs on every route; each procedure decides for
// itself whether it needs a caller.
pub mod assets;
pub mod auth;
pub mod rpc;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::store::EntityStore;
use crate::middleware::resolve_session;
use crate::rpc::{build_registry, Registry};

/// Shared application state. Cloning is cheap; both handles are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            registry: Arc::new(build_registry()),
        }
    }
}

/// Builds the application router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/callback", post(auth::callback))
        .route("/auth/session", get(auth::session))
        .route("/api/assets", post(assets::upload))
        .route(
            "/rpc/:procedure",
            get(rpc::call_query).post(rpc::call_mutation),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            resolve_session,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - service index with the procedure listing.
async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let procedures: Vec<Value> = state
        .registry
        .names()
        .into_iter()
        .map(|(name, kind)| json!({ "name": name, "kind": kind }))
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Beeno API (Rust)",
            "version": version,
            "description": "K-pop digital card trading platform backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/callback, /auth/session",
                "assets": "/api/assets (session required)",
                "rpc": "/rpc/:procedure (GET for queries, POST for mutations)",
            },
            "procedures": procedures,
        }
    }))
}

/// GET /health - liveness plus store connectivity.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": {
                    "kind": "SERVICE_UNAVAILABLE",
                    "message": "database unavailable"
                },
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
