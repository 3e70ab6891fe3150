use reqwest::Client;
use serde::{Deserialize, Serialize};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyRequest<'a> {
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

/// Client for the AI proxy backend.
///
/// Every failure (transport, status, decoding) is logged and collapses to
/// `None`. There are no retries.
#[derive(Clone)]
pub struct AiProxyClient {
    client: Client,
    base_url: String,
}

impl AiProxyClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat_optimize(&self, prompt: &str) -> Option<String> {
        debug!(
            prompt = %prompt.chars().take(30).collect::<String>(),
            "Sending chat request"
        );
        self.post_for_text("chat-optimize", &ChatRequest { prompt })
            .await
    }

    /// Sends an image for identification. A `data:image/...;base64,` header
    /// is stripped before sending.
    pub async fn image_identify(&self, image_base64: &str) -> Option<String> {
        let image_base64 = strip_data_uri(image_base64);
        debug!(kb = image_base64.len() / 1024, "Sending image identify request");
        self.post_for_text("image-identify", &IdentifyRequest { image_base64 })
            .await
    }

    async fn post_for_text<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Option<String> {
        let url = format!("{}/api/{}", self.base_url, endpoint);

        let response = match self.client.post(&url).json(body).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(endpoint, "AI proxy request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(endpoint, %status, "AI proxy error: {}", body);
            return None;
        }

        match response.json::<TextResponse>().await {
            Ok(parsed) => Some(parsed.text),
            Err(e) => {
                error!(endpoint, "Invalid AI proxy response: {}", e);
                None
            }
        }
    }
}

#[must_use]
pub fn strip_data_uri(image: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|jpg);base64,").expect("Invalid regex")
    });

    match re.find(image) {
        Some(m) => &image[m.end()..],
        None => image,
    }
}
