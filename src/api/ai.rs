use axum::{Json, extract::State};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::observability::record_upstream;
use super::validation::{validate_image, validate_prompt};
use super::{ApiError, AppState, ChatRequest, IdentifyRequest, TextResponse};

pub async fn chat_optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TextResponse>, ApiError> {
    let prompt = validate_prompt(request.prompt.as_deref())?;
    info!(
        prompt = %prompt.chars().take(100).collect::<String>(),
        "Chat optimize request"
    );

    let started = Instant::now();
    let result = state.provider.chat(prompt).await;
    record_upstream("chat", &result, started);
    let text = result?;
    info!(chars = text.chars().count(), "Chat optimize succeeded");

    Ok(Json(TextResponse { text }))
}

pub async fn image_identify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<TextResponse>, ApiError> {
    let image = validate_image(request.image_base64.as_deref())?;
    info!(bytes = image.len(), "Image identify request");

    let started = Instant::now();
    let result = state.provider.identify_image(image).await;
    record_upstream("identify", &result, started);
    let text = result?;
    info!(reply = %text, "Image identify succeeded");

    Ok(Json(TextResponse { text }))
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    let result = state.provider.list_models().await;
    record_upstream("list_models", &result, started);
    Ok(Json(result?))
}
