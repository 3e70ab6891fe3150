use std::sync::Arc;
use tokio::sync::broadcast;

use crate::clients::ai_proxy::AiProxyClient;
use crate::clients::jikan::{JikanClient, MetadataSource};
use crate::config::Config;
use crate::domain::LibraryEvent;
use crate::services::{AnimeLibrary, CustomListService, EnrichmentService};
use crate::storage::{CollectionStorage, FileStore, KeyValueStore};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("anime-archive/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything a front end needs to work with the collection.
#[derive(Clone)]
pub struct SharedState {
    pub library: Arc<AnimeLibrary>,

    pub custom_lists: Arc<CustomListService>,

    pub ai: Arc<AiProxyClient>,

    pub event_bus: broadcast::Sender<LibraryEvent>,
}

impl SharedState {
    /// Opens the file store under `general.data_dir` and wires the services
    /// to Jikan and the AI proxy.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.data_dir())?);

        let jikan_client = build_shared_http_client(config.jikan.request_timeout_seconds)?;
        let jikan: Arc<dyn MetadataSource> =
            Arc::new(JikanClient::with_shared_client(jikan_client, &config.jikan));

        let ai_client = build_shared_http_client(config.ai.request_timeout_seconds)?;
        let ai = Arc::new(AiProxyClient::new(ai_client, config.backend_url()));

        Self::with_components(&config, kv, jikan, ai)
    }

    /// Builds the state over caller-supplied storage and metadata source.
    pub fn with_components(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        metadata: Arc<dyn MetadataSource>,
        ai: Arc<AiProxyClient>,
    ) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));

        let library = Arc::new(AnimeLibrary::open(
            CollectionStorage::new(kv.clone()),
            EnrichmentService::new(metadata),
            event_bus.clone(),
            config.library.seed_sample_data,
        )?);

        let custom_lists = Arc::new(CustomListService::open(kv, event_bus.clone())?);

        Ok(Self {
            library,
            custom_lists,
            ai,
            event_bus,
        })
    }
}
