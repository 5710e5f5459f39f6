pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::services::IngestPolicy;
use crate::storage::BlobStore;

/// Application state shared across handlers. `db` is `None` when the
/// server runs without persistence.
#[derive(Clone)]
pub struct AppState {
    pub db: Option<Database>,
    pub config: Arc<Config>,
    pub storage: Arc<dyn BlobStore>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Body limits mirror each endpoint's ingestion policy
    let form_routes = Router::new()
        .route("/", get(handlers::form::show_form))
        .route("/submit", post(handlers::form::submit))
        .layer(DefaultBodyLimit::max(
            IngestPolicy::FORM.max_body_bytes as usize,
        ));

    let api_routes = Router::new()
        .route("/api/users", post(handlers::api::create_user))
        .layer(DefaultBodyLimit::max(
            IngestPolicy::API.max_body_bytes as usize,
        ));

    Router::new()
        .merge(form_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
