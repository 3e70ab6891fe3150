use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the AI proxy backend, consulted both at
/// build time and at run time.
pub const BACKEND_URL_ENV: &str = "ANIME_ARCHIVE_BACKEND_URL";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub library: LibraryConfig,

    pub jikan: JikanConfig,

    pub ai: AiConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding one JSON file per storage key.
    pub data_dir: String,

    pub log_level: String,

    /// Store event channel capacity (default: 100)
    pub event_bus_buffer_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
            event_bus_buffer_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Write the sample records when the collection has never been saved.
    pub seed_sample_data: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            seed_sample_data: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JikanConfig {
    pub base_url: String,

    pub search_limit: u32,

    /// Minimum spacing between Jikan requests; 0 disables throttling.
    pub min_request_interval_ms: u64,

    pub request_timeout_seconds: u64,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: crate::clients::jikan::JIKAN_API.to_string(),
            search_limit: 5,
            min_request_interval_ms: 1000,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the AI proxy backend. Overridden by
    /// `ANIME_ARCHIVE_BACKEND_URL`, see [`Config::backend_url`].
    pub backend_url: String,

    pub request_timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5001".to_string(),
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Upper bound for request bodies; images arrive base64-encoded.
    pub body_limit_bytes: usize,

    pub gemini_base_url: String,

    pub chat_model: String,

    pub vision_model: String,

    /// Provider key. `GEMINI_API_KEY` takes precedence; never written back.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            cors_allowed_origins: vec!["*".to_string()],
            body_limit_bytes: 10 * 1024 * 1024,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1/models".to_string(),
            chat_model: "gemini-1.5-flash-latest".to_string(),
            vision_model: "gemini-1.5-flash".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            library: LibraryConfig::default(),
            jikan: JikanConfig::default(),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("anime-archive").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".anime-archive").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.jikan.base_url).context("Invalid Jikan base URL")?;
        url::Url::parse(&self.server.gemini_base_url).context("Invalid Gemini base URL")?;
        url::Url::parse(&self.backend_url()).context("Invalid AI backend URL")?;

        if self.jikan.search_limit == 0 {
            anyhow::bail!("Jikan search limit must be > 0");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        Ok(())
    }

    /// Resolves the AI backend URL: build-time value, then run-time
    /// environment, then the configured (default) value.
    #[must_use]
    pub fn backend_url(&self) -> String {
        resolve_backend_url(
            option_env!("ANIME_ARCHIVE_BACKEND_URL"),
            std::env::var(BACKEND_URL_ENV).ok().as_deref(),
            &self.ai.backend_url,
        )
    }

    /// The provider key from `GEMINI_API_KEY`, else the config file.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.server.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.data_dir)
    }
}

fn resolve_backend_url(build_time: Option<&str>, runtime: Option<&str>, configured: &str) -> String {
    [build_time, runtime]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(configured)
        .trim_end_matches('/')
        .to_string()
}

/// Loads `.env.local` then `.env`; earlier files win.
pub fn load_dotenv() {
    for file in [".env.local", ".env"] {
        if dotenvy::from_filename(file).is_ok() {
            info!("Loaded environment from {file}");
        }
    }
}
