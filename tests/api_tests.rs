use anime_archive::api::AppState;
use anime_archive::clients::gemini::{GenerativeProvider, ProviderError};
use anime_archive::config::{Config, ServerConfig};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Echoes requests back and records the image payload it was given.
#[derive(Default)]
struct FakeProvider {
    fail_with: Option<u16>,
    last_image: Mutex<Option<String>>,
}

#[async_trait::async_trait]
impl GenerativeProvider for FakeProvider {
    async fn chat(&self, prompt: &str) -> Result<String, ProviderError> {
        if let Some(status) = self.fail_with {
            return Err(ProviderError::Upstream {
                status,
                body: "quota exceeded".to_string(),
            });
        }
        Ok(format!("optimized: {prompt}"))
    }

    async fn identify_image(&self, image_base64: &str) -> Result<String, ProviderError> {
        *self.last_image.lock().unwrap() = Some(image_base64.to_string());
        Ok(r#"{"title": "鬼滅の刃", "confidencePercent": 95}"#.to_string())
    }

    async fn list_models(&self) -> Result<Value, ProviderError> {
        Ok(json!({"models": [{"name": "models/gemini-1.5-flash"}]}))
    }
}

fn spawn_app(provider: Arc<FakeProvider>) -> Router {
    anime_archive::api::router(AppState::new(provider, None), &ServerConfig::default())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_chat_optimize() {
    let app = spawn_app(Arc::new(FakeProvider::default()));

    let response = app
        .clone()
        .oneshot(post_json("/api/chat-optimize", &json!({"prompt": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await, json!({"text": "optimized: hello"}));
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let app = spawn_app(Arc::new(FakeProvider::default()));

    let response = app
        .clone()
        .oneshot(post_json("/api/chat-optimize", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "prompt is required"}));

    let response = app
        .clone()
        .oneshot(post_json("/api/image-identify", &json!({"imageBase64": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "imageBase64 is required"})
    );
}

#[tokio::test]
async fn test_image_identify_strips_data_uri() {
    let provider = Arc::new(FakeProvider::default());
    let app = spawn_app(provider.clone());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/image-identify",
            &json!({"imageBase64": "data:image/png;base64,iVBORw0KGgo="}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["text"].as_str().unwrap().contains("鬼滅の刃"));
    assert_eq!(
        provider.last_image.lock().unwrap().as_deref(),
        Some("iVBORw0KGgo=")
    );
}

#[tokio::test]
async fn test_upstream_status_is_forwarded() {
    let provider = Arc::new(FakeProvider {
        fail_with: Some(429),
        ..Default::default()
    });
    let app = spawn_app(provider);

    let response = app
        .clone()
        .oneshot(post_json("/api/chat-optimize", &json!({"prompt": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Gemini API request failed", "details": "quota exceeded"})
    );
}

#[tokio::test]
async fn test_list_models_passthrough() {
    let app = spawn_app(Arc::new(FakeProvider::default()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/list-models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["models"][0]["name"], "models/gemini-1.5-flash");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = spawn_app(Arc::new(FakeProvider::default()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_server_requires_api_key() {
    let mut config = Config::default();
    config.server.api_key = None;

    // The environment may provide a key; only assert when it does not.
    if std::env::var(anime_archive::config::API_KEY_ENV).is_err() {
        assert!(anime_archive::api::create_app_state_from_config(&config, None).is_err());
    }

    config.server.api_key = Some("test-key".to_string());
    assert!(anime_archive::api::create_app_state_from_config(&config, None).is_ok());
}
