//! # Core Configuration Module
//!
//! Configuration for the streaming core, assembled through
//! [`CoreConfig::builder`]. The builder validates eagerly so a misconfigured
//! host fails at startup with an actionable message instead of at the first
//! catalog request.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - requests to the catalog API (desktop default: reqwest)
//! - `SettingsStore` - watch history persistence (desktop default: SQLite)
//!
//! Both are injected automatically when the `desktop-shims` feature is enabled
//! and the host did not provide its own.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://api.sansekai.my.id/api")
//!     .request_timeout(Duration::from_secs(15))
//!     .http_client(Arc::new(MyHttpClient))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upstream catalog API used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.sansekai.my.id/api";
/// Site that anime page URLs (the anime provider's identifiers) live on.
pub const DEFAULT_ANIME_SITE_BASE: &str = "https://otakudesu.cloud";
/// Environment variable overriding [`DEFAULT_API_BASE_URL`] in [`CoreConfigBuilder::from_env`].
pub const API_BASE_URL_ENV: &str = "DRAMA_STREAM_API_BASE_URL";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_QUERY_STALE_TIME: Duration = Duration::from_secs(5 * 60);
const DEFAULT_QUERY_CACHE_CAPACITY: usize = 64;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Watch-history persistence settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    /// Settings key holding the serialized history log
    pub storage_key: String,
    /// Maximum number of entries kept, most recent first
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            storage_key: "drama-stream-history".to_string(),
            capacity: 20,
        }
    }
}

/// Playback session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// How long a load may take to reach a playable state before it times out
    pub watchdog_timeout: Duration,
    /// Attempt to start playback as soon as the session is ready
    pub autoplay: bool,
    /// Hint for segmented playback: prefer the live edge
    pub low_latency: bool,
    /// Hint for segmented playback: demux off the main thread
    pub enable_worker: bool,
    /// Cap on network-class reload attempts per load; `None` retries forever
    pub max_network_retries: Option<u32>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            watchdog_timeout: Duration::from_secs(10),
            autoplay: true,
            low_latency: true,
            enable_worker: true,
            max_network_retries: None,
        }
    }
}

/// Core configuration for the streaming core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL of the catalog API, without trailing slash
    pub api_base_url: String,

    /// Base URL anime slugs are expanded against
    pub anime_site_base: String,

    /// Per-request timeout for catalog calls
    pub request_timeout: Duration,

    /// How long a successful list query is served from cache
    pub query_stale_time: Duration,

    /// Number of distinct list queries kept in cache
    pub query_cache_capacity: usize,

    /// Broadcast buffer of the core event bus
    pub event_buffer_size: usize,

    pub history: HistorySettings,

    pub playback: PlaybackSettings,

    /// HTTP client for catalog requests
    pub http_client: Arc<dyn HttpClient>,

    /// Key-value store backing the watch history
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source for history timestamps and cache staleness
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("anime_site_base", &self.anime_site_base)
            .field("request_timeout", &self.request_timeout)
            .field("query_stale_time", &self.query_stale_time)
            .field("query_cache_capacity", &self.query_cache_capacity)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("history", &self.history)
            .field("playback", &self.playback)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        validate_base_url("API base URL", &self.api_base_url)?;
        validate_base_url("Anime site base", &self.anime_site_base)?;

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout > Duration::from_secs(300) {
            return Err(Error::Config(
                "Request timeout exceeds maximum of 300 seconds".to_string(),
            ));
        }

        if self.query_cache_capacity == 0 {
            return Err(Error::Config(
                "Query cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.history.storage_key.trim().is_empty() {
            return Err(Error::Config(
                "History storage key cannot be empty".to_string(),
            ));
        }

        if self.history.capacity == 0 {
            return Err(Error::Config(
                "History capacity must be greater than 0".to_string(),
            ));
        }

        if self.playback.watchdog_timeout.is_zero() {
            return Err(Error::Config(
                "Playback watchdog timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_base_url(name: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::Config(format!("{} cannot be empty", name)));
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "{} must start with http:// or https:// (got '{}')",
            name, url
        )));
    }

    Ok(())
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for catalog requests. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Mobile: inject a platform-native HTTP adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for watch history. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore). \
                 Web: inject a localStorage-based settings store."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = path.unwrap_or_else(bridge_desktop::default_settings_path);

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside a running runtime, so hop to a plain thread.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    anime_site_base: Option<String>,
    request_timeout: Option<Duration>,
    query_stale_time: Option<Duration>,
    query_cache_capacity: Option<usize>,
    event_buffer_size: Option<usize>,
    history: Option<HistorySettings>,
    playback: Option<PlaybackSettings>,
    settings_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Starts a builder that picks up the API base URL from
    /// `DRAMA_STREAM_API_BASE_URL` when it is set and non-empty.
    pub fn from_env() -> Self {
        let builder = Self::default();
        match std::env::var(API_BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => builder.api_base_url(url.trim()),
            _ => builder,
        }
    }

    /// Sets the catalog API base URL. A trailing slash is dropped.
    ///
    /// Default: `https://api.sansekai.my.id/api`
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Sets the site anime slugs are expanded against.
    ///
    /// Default: `https://otakudesu.cloud`
    pub fn anime_site_base(mut self, url: impl Into<String>) -> Self {
        self.anime_site_base = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Default: 15 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Default: 5 minutes. `Duration::ZERO` disables caching.
    pub fn query_stale_time(mut self, stale_time: Duration) -> Self {
        self.query_stale_time = Some(stale_time);
        self
    }

    /// Default: 64
    pub fn query_cache_capacity(mut self, capacity: usize) -> Self {
        self.query_cache_capacity = Some(capacity);
        self
    }

    /// Default: 256
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn history(mut self, settings: HistorySettings) -> Self {
        self.history = Some(settings);
        self
    }

    pub fn playback(mut self, settings: PlaybackSettings) -> Self {
        self.playback = Some(settings);
        self
    }

    /// Location of the default SQLite settings database (desktop shims only).
    pub fn settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    ///
    /// If not provided, an SQLite store at [`settings_path`](Self::settings_path)
    /// is opened when the `desktop-shims` feature is enabled.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Default: [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default is available
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let config = CoreConfig {
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            anime_site_base: self
                .anime_site_base
                .unwrap_or_else(|| DEFAULT_ANIME_SITE_BASE.to_string()),
            request_timeout,
            query_stale_time: self.query_stale_time.unwrap_or(DEFAULT_QUERY_STALE_TIME),
            query_cache_capacity: self
                .query_cache_capacity
                .unwrap_or(DEFAULT_QUERY_CACHE_CAPACITY),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            history: self.history.unwrap_or_default(),
            playback: self.playback.unwrap_or_default(),
            http_client,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "[]"))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn builder_with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder_with_bridges().build().unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.anime_site_base, DEFAULT_ANIME_SITE_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.query_stale_time, Duration::from_secs(300));
        assert_eq!(config.history.storage_key, "drama-stream-history");
        assert_eq!(config.history.capacity, 20);
        assert_eq!(config.playback.watchdog_timeout, Duration::from_secs(10));
        assert!(config.playback.autoplay);
        assert_eq!(config.playback.max_network_retries, None);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = builder_with_bridges()
            .api_base_url("https://mirror.example.com/api/")
            .anime_site_base("https://anime.example.com/")
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "https://mirror.example.com/api");
        assert_eq!(config.anime_site_base, "https://anime.example.com");
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let result = builder_with_bridges().api_base_url("ftp://example.com").build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("http://")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = builder_with_bridges()
            .request_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_history_capacity() {
        let result = builder_with_bridges()
            .history(HistorySettings {
                storage_key: "history".to_string(),
                capacity: 0,
            })
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("History capacity")));
    }

    #[test]
    fn test_validate_rejects_zero_watchdog() {
        let result = builder_with_bridges()
            .playback(PlaybackSettings {
                watchdog_timeout: Duration::ZERO,
                ..PlaybackSettings::default()
            })
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected missing capability, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "SettingsStore")
            }
            other => panic!("expected missing capability, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        let config = CoreConfig::builder()
            .settings_path(base.join("settings.db"))
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        let _ = std::fs::remove_dir_all(base);
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_build_with_desktop_defaults_inside_runtime() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        let config = CoreConfig::builder()
            .settings_path(base.join("settings.db"))
            .build()
            .unwrap();

        assert_eq!(config.history.capacity, 20);
        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = builder_with_bridges().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("HttpClient { ... }"));
        assert!(debug.contains("drama-stream-history"));
    }
}
