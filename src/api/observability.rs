//! Request tracing and proxy metrics.
//!
//! Two families of series are exported: `ai_proxy_requests_*` for what the
//! front end sees, and `ai_proxy_upstream_*` for each call forwarded to the
//! generative provider.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::AppState;
use crate::clients::gemini::ProviderError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.prometheus_handle {
        Some(handle) => handle.render(),
        None => "Metrics not enabled or failed to initialize".to_string(),
    }
}

/// Runs each proxy request inside a span keyed by a fresh request id, which
/// is echoed back in the `x-request-id` header.
pub async fn request_span_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    // Unmatched paths share one label so scanners cannot blow up the series.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let span = info_span!(
        "proxy_request",
        request_id = %request_id,
        method = %req.method(),
        route = %route,
    );

    async move {
        let mut response = next.run(req).await;
        let status = response.status().as_u16();

        let labels = [("route", route), ("status", status.to_string())];
        metrics::counter!("ai_proxy_requests_total", &labels).increment(1);
        metrics::histogram!("ai_proxy_request_duration_seconds", &labels)
            .record(started.elapsed().as_secs_f64());

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(status, elapsed_ms, "Proxy request finished");
        response
    }
    .instrument(span)
    .await
}

/// Records the result of one forwarded provider call.
pub fn record_upstream<T>(
    operation: &'static str,
    result: &Result<T, ProviderError>,
    started: Instant,
) {
    let outcome = upstream_outcome(result);
    if result.is_err() {
        warn!(operation, outcome = %outcome, "Provider call failed");
    }

    metrics::counter!(
        "ai_proxy_upstream_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("ai_proxy_upstream_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// `ok`, the upstream HTTP status, `transport`, or `missing_key`.
#[must_use]
pub fn upstream_outcome<T>(result: &Result<T, ProviderError>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(ProviderError::Upstream { status, .. }) => status.to_string(),
        Err(ProviderError::Transport(_)) => "transport".to_string(),
        Err(ProviderError::MissingApiKey) => "missing_key".to_string(),
    }
}
