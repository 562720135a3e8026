//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges carried by [`CoreConfig`]
//! (HTTP client, settings store, clock) into the catalog, history and
//! playback crates. Desktop hosts typically enable the `desktop-shims`
//! feature, which lets the configuration fall back to the reqwest and SQLite
//! bridges from `bridge-desktop`.

pub mod error;
pub mod watch;

pub use error::{CoreError, Result};
pub use watch::{WatchRequest, WatchService};

use std::sync::Arc;

use core_catalog::providers::CatalogProvider;
use core_catalog::{
    AnimeClient, ApiClient, CacheSettings, CatalogAggregator, DramaBoxClient, MeloloClient,
    NetShortClient,
};
use core_history::HistoryStore;
use core_playback::{MediaBackend, PlaybackConfig, PlaybackSession};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    events: EventBus,
    catalog: Arc<CatalogAggregator>,
    history: Arc<HistoryStore>,
    watch: WatchService,
}

impl CoreService {
    /// Create a new service from a built configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let api = ApiClient::new(
            config.http_client.clone(),
            config.api_base_url.clone(),
            config.request_timeout,
        );

        let providers: Vec<Arc<dyn CatalogProvider>> = vec![
            Arc::new(DramaBoxClient::new(api.clone())),
            Arc::new(NetShortClient::new(api.clone())),
            Arc::new(MeloloClient::new(api.clone())),
            Arc::new(AnimeClient::new(api, config.anime_site_base.clone())),
        ];
        let cache = CacheSettings {
            capacity: config.query_cache_capacity,
            stale_after: config.query_stale_time,
        };
        let catalog = Arc::new(
            CatalogAggregator::new(providers, cache, config.clock.clone())
                .with_event_bus(events.clone()),
        );

        let history = Arc::new(
            HistoryStore::new(
                config.settings_store.clone(),
                config.clock.clone(),
                &config.history,
            )
            .with_event_bus(events.clone()),
        );

        let watch = WatchService::new(catalog.clone(), history.clone());

        info!(api_base_url = %config.api_base_url, "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            events,
            catalog,
            history,
            watch,
        })
    }

    /// Builds the configuration from the environment and desktop defaults.
    #[cfg(feature = "desktop-shims")]
    pub fn bootstrap_desktop() -> Result<Self> {
        let config = core_runtime::config::CoreConfigBuilder::from_env().build()?;
        Self::new(config)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Search, home feed, detail and stream resolution across all providers.
    pub fn catalog(&self) -> &Arc<CatalogAggregator> {
        &self.catalog
    }

    /// The continue-watching log.
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn watch(&self) -> &WatchService {
        &self.watch
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// A playback session over `backend`, using the configured playback
    /// settings and publishing on the core event bus.
    pub fn new_playback_session(&self, backend: Arc<dyn MediaBackend>) -> Result<PlaybackSession> {
        let session = PlaybackSession::new(backend, PlaybackConfig::from(&self.config.playback))?;
        Ok(session.with_event_bus(self.events.clone()))
    }
}
