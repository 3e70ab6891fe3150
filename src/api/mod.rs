//! HTTP proxy in front of the generative model provider.
//!
//! The server keeps no state of its own; it validates requests, forwards them
//! to the [`GenerativeProvider`] and relays the reply text.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::clients::gemini::{GeminiClient, GenerativeProvider};
use crate::config::{Config, ServerConfig};
use crate::state::build_shared_http_client;

mod ai;
mod error;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

/// Upstream calls for image identification can be slow.
const PROVIDER_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn GenerativeProvider>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            prometheus_handle,
        })
    }
}

/// Builds the state backed by Gemini. Fails when no API key is configured.
pub fn create_app_state_from_config(
    config: &Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "{} is not set (add it to .env.local or server.api_key in config.toml)",
            crate::config::API_KEY_ENV
        )
    })?;

    let client = build_shared_http_client(PROVIDER_TIMEOUT_SECS)?;
    let provider = GeminiClient::new(client, &config.server, api_key);

    Ok(AppState::new(Arc::new(provider), prometheus_handle))
}

pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let api_router = Router::new()
        .route("/chat-optimize", post(ai::chat_optimize))
        .route("/image-identify", post(ai::image_identify))
        .route("/list-models", get(ai::list_models));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::request_span_middleware))
}
