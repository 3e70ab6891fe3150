use anyhow::Result;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::JikanConfig;

pub const JIKAN_API: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct JikanResponse<T> {
    data: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MalAnime {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub images: Option<MalImages>,
    pub genres: Option<Vec<MalGenericInfo>>,
    pub year: Option<i32>,
    pub aired: Option<Aired>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MalImages {
    pub jpg: Option<MalImageSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MalImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aired {
    pub from: Option<String>,
    pub prop: Option<AiredProp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiredProp {
    pub from: Option<AiredDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiredDate {
    pub day: Option<i32>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

impl MalAnime {
    /// First-air year, falling back to the season year.
    pub fn get_start_year(&self) -> Option<i32> {
        self.aired
            .as_ref()
            .and_then(|a| a.prop.as_ref())
            .and_then(|p| p.from.as_ref())
            .and_then(|f| f.year)
            .or(self.year)
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|i| i.jpg.as_ref())
            .and_then(|j| j.image_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn genre_names(&self) -> impl Iterator<Item = &str> {
        self.genres
            .iter()
            .flatten()
            .map(|g| g.name.as_str())
    }

    /// Whether any of the primary, English or Japanese titles equals
    /// `title`, ignoring case.
    pub fn matches_title(&self, title: &str) -> bool {
        let wanted = title.to_lowercase();
        std::iter::once(Some(self.title.as_str()))
            .chain([self.title_english.as_deref(), self.title_japanese.as_deref()])
            .flatten()
            .any(|candidate| candidate.to_lowercase() == wanted)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MalGenericInfo {
    pub mal_id: i32,
    pub name: String,
    pub url: Option<String>,
}

/// Title search against an anime metadata catalogue.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Ranked candidates for `query`, best first.
    async fn search(&self, query: &str) -> Result<Vec<MalAnime>>;
}

#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
    search_limit: u32,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    pub fn new() -> Self {
        Self::with_shared_client(Client::new(), &JikanConfig::default())
    }

    pub fn with_shared_client(client: Client, config: &JikanConfig) -> Self {
        let limiter = Quota::with_period(Duration::from_millis(config.min_request_interval_ms))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_limit: config.search_limit,
            limiter,
        }
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MalAnime>> {
        self.throttle().await;

        let url = format!(
            "{}/anime?q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.search_limit
        );
        tracing::debug!(url = %url, "Jikan search");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Jikan API error: {} - {}", status, body));
        }

        let response: JikanResponse<Vec<MalAnime>> = response.json().await?;

        Ok(response.data)
    }
}

#[async_trait::async_trait]
impl MetadataSource for JikanClient {
    async fn search(&self, query: &str) -> Result<Vec<MalAnime>> {
        Self::search(self, query).await
    }
}
