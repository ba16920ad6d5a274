//! HDB Resale Price Predictor - Main Entry Point
//!
//! Serves resale price estimates for HDB flats, with an optional
//! per-feature attribution of each estimate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HDB PRICE SERVICE                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST /api/v1/predict                                        │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌───────────┐   ┌───────────┐   ┌─────────────────────────┐ │
//! │  │ Feature   │──▶│ Predictor │   │ Explainer               │ │
//! │  │ Builder   │   │ (trees /  │   │ (TreeSHAP over          │ │
//! │  │ (one-hot) │──▶│  ONNX)    │   │  reference + user row)  │ │
//! │  └───────────┘   └───────────┘   └─────────────────────────┘ │
//! │                        ▲                     ▲               │
//! │                        └──── ModelContext ───┘               │
//! │                        (loaded once, read-only)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod error;
mod handlers;
mod logic;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logic::model::{InferenceStats, ModelContext};

pub use error::AppResult;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| constants::DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "{} v{} starting ({})",
        constants::APP_NAME,
        constants::APP_VERSION,
        config.environment
    );

    // Artifacts are loaded once; any failure stops the process
    let paths = config.artifact_paths();
    let context = tokio::task::spawn_blocking(move || ModelContext::load(&paths))
        .await
        .context("artifact loader panicked")?
        .context("failed to load model artifacts")?;

    tracing::info!(?context, "Model context ready");

    let state = AppState {
        context: Arc::new(context),
        stats: Arc::new(InferenceStats::default()),
        config: config.clone(),
    };

    let app = create_router(state);

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid HOST {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ModelContext>,
    pub stats: Arc<InferenceStats>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/schema", get(handlers::schema::get))
        .route("/api/v1/status", get(handlers::status::get))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
