//! Gemini `generateContent` client used by the proxy backend.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ServerConfig;

const CHAT_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.2,
    top_k: 40,
    top_p: 0.95,
    max_output_tokens: 8192,
};

const VISION_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.2,
    top_k: 32,
    top_p: 0.95,
    max_output_tokens: 4096,
};

pub const IDENTIFY_PROMPT: &str = "この画像に描かれているアニメ作品を特定してください。古い作品も含めて考慮してください。「めぞん一刻」「ゆるキャン」「進撃の巨人」などの一般的なアニメ作品を考慮してください。日本語でタイトルを返し、JSON形式で返してください: {\"title\": \"日本語のタイトル\", \"confidencePercent\": 信頼度の数値}";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Gemini API request failed with status {status}")]
    Upstream { status: u16, body: String },

    #[error("Gemini transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API key is not configured")]
    MissingApiKey,
}

/// A generative model backend the proxy forwards to.
#[async_trait::async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Text completion for `prompt`.
    async fn chat(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Identifies the anime in a base64 JPEG (no data-URI header).
    async fn identify_image(&self, image_base64: &str) -> Result<String, ProviderError>;

    /// The provider's raw model listing.
    async fn list_models(&self) -> Result<Value, ProviderError>;
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: &ServerConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
        }
    }

    async fn generate(
        &self,
        model: &str,
        parts: Vec<Part<'_>>,
        generation_config: GenerationConfig,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            model,
            urlencoding::encode(&self.api_key)
        );
        let body = GenerateRequest {
            contents: [Content { parts }],
            generation_config,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(model, status, "Gemini API error: {}", body);
            return Err(ProviderError::Upstream { status, body });
        }

        let data: Value = response.json().await?;
        Ok(extract_text(&data))
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for GeminiClient {
    async fn chat(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate(
            &self.chat_model,
            vec![Part::Text { text: prompt }],
            CHAT_GENERATION,
        )
        .await
    }

    async fn identify_image(&self, image_base64: &str) -> Result<String, ProviderError> {
        self.generate(
            &self.vision_model,
            vec![
                Part::Text {
                    text: IDENTIFY_PROMPT,
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: "image/jpeg",
                        data: image_base64,
                    },
                },
            ],
            VISION_GENERATION,
        )
        .await
    }

    async fn list_models(&self) -> Result<Value, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let url = format!("{}?key={}", self.base_url, urlencoding::encode(&self.api_key));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status, body });
        }

        Ok(response.json().await?)
    }
}

/// `candidates[0].content.parts[0].text`, or empty.
#[must_use]
pub fn extract_text(data: &Value) -> String {
    data.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
