//! Predictive Maintenance API
//!
//! Serves a pre-trained failure classifier and remaining-useful-life
//! regressor over HTTP, plus a lookup of historical machine readings.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 PREDICTIVE MAINTENANCE API                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │  API      │  │  Model Registry  │  │  Dataset         │  │
//! │  │  (Axum)   │─▶│  (read-only Arc) │  │  (CSV, per call) │  │
//! │  └─────┬─────┘  └──────────────────┘  └────────▲─────────┘  │
//! │        └───────────────────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<inference::ModelRegistry>,
    pub config: config::Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let prediction_routes = Router::new()
        .route("/predict", post(handlers::predict::predict_failure))
        .route("/predict_rul", post(handlers::predict::predict_rul))
        .route("/what_if", post(handlers::predict::what_if));

    let data_routes = Router::new()
        .route("/api/timeseries/:machine_id", get(handlers::timeseries::get));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(prediction_routes)
        .merge(data_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
