//! Store service: SQLite-backed row endpoints plus per-collection change channels.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET|POST|PUT|DELETE /rest/{collection}`: row access
//! - `GET /realtime/{collection}`: WebSocket change channel

pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod realtime;
pub mod rest;

pub use auth::ApiKeyStore;
pub use config::ServerConfig;
pub use hub::ChangeHub;

use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::db::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: Arc<ChangeHub>,
    pub api_keys: Arc<ApiKeyStore>,
}

impl AppState {
    pub fn new(db: Database, api_keys: ApiKeyStore) -> Self {
        Self {
            db,
            hub: Arc::new(ChangeHub::new()),
            api_keys: Arc::new(api_keys),
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/rest/{collection}",
            get(rest::select)
                .post(rest::insert)
                .put(rest::upsert)
                .delete(rest::delete),
        )
        .route("/realtime/{collection}", get(realtime::subscribe))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves the store until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
