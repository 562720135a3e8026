//! Glue between a title's detail page, the player and the watch history.

use crate::error::Result;
use core_catalog::normalize::UNTITLED;
use core_catalog::{CatalogAggregator, Episode, MediaItem, Provider};
use core_history::{HistoryRepository, RecordOutcome};
use core_playback::{SessionState, SessionWatcher, StateTransition};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

/// The episode a player was opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    pub provider: Provider,
    pub media_id: String,
    pub episode_id: String,
}

impl WatchRequest {
    pub fn new(provider: Provider, media_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            provider,
            media_id: media_id.into(),
            episode_id: episode_id.into(),
        }
    }
}

#[derive(Clone)]
pub struct WatchService {
    catalog: Arc<CatalogAggregator>,
    history: Arc<dyn HistoryRepository>,
}

impl WatchService {
    pub fn new(catalog: Arc<CatalogAggregator>, history: Arc<dyn HistoryRepository>) -> Self {
        Self { catalog, history }
    }

    /// Playable URL for an episode.
    ///
    /// An inline URL on `known_episode` wins; otherwise the provider resolves
    /// the stream.
    #[instrument(skip(self, known_episode))]
    pub async fn resolve_stream(
        &self,
        provider: Provider,
        media_id: &str,
        episode_id: &str,
        known_episode: Option<&Episode>,
    ) -> Result<String> {
        let inline = known_episode
            .and_then(|episode| episode.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty());
        if let Some(url) = inline {
            debug!("Using inline episode URL");
            return Ok(url.to_string());
        }

        Ok(self.catalog.stream_url(provider, media_id, episode_id).await?)
    }

    /// Waits until the session starts playing, then records the episode.
    ///
    /// Take the watcher before calling `load` on the session. Returns `None`
    /// when the load fails, times out, or the session is closed or dropped
    /// first.
    pub async fn record_on_start(
        &self,
        mut watcher: SessionWatcher,
        request: WatchRequest,
    ) -> Result<Option<RecordOutcome>> {
        let mut loading = false;
        loop {
            match watcher.recv().await {
                Ok(StateTransition { to, .. }) if to.is_ready() => break,
                Ok(StateTransition { to, .. }) if to.is_terminal() => {
                    debug!(state = %to, "Playback never started; nothing recorded");
                    return Ok(None);
                }
                Ok(StateTransition {
                    to: SessionState::Init,
                    ..
                }) => {
                    if loading {
                        return Ok(None);
                    }
                }
                Ok(_) => loading = true,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Transition feed lagged; checking the session");
                    // A lag means the load has started.
                    match watcher.snapshot() {
                        Some(snapshot) if snapshot.reached_ready || snapshot.state.is_ready() => break,
                        Some(snapshot)
                            if snapshot.state.is_terminal() || snapshot.state == SessionState::Init =>
                        {
                            return Ok(None)
                        }
                        Some(_) => loading = true,
                        None => return Ok(None),
                    }
                }
                Err(RecvError::Closed) => return Ok(None),
            }
        }

        self.record_started(&request).await.map(Some)
    }

    /// Records `request` with whatever metadata the catalog can provide.
    #[instrument(skip_all, fields(provider = %request.provider, media_id = %request.media_id))]
    pub async fn record_started(&self, request: &WatchRequest) -> Result<RecordOutcome> {
        let (item, episode_title) = match self
            .catalog
            .detail(request.provider, &request.media_id)
            .await
        {
            Ok(detail) => {
                let title = detail
                    .find_episode(&request.episode_id)
                    .map(|episode| episode.title.clone())
                    .filter(|title| !title.trim().is_empty());
                (detail.item, title)
            }
            Err(e) => {
                warn!(error = %e, "Detail unavailable; recording with placeholder metadata");
                (placeholder_item(request), None)
            }
        };

        let label = episode_title.unwrap_or_else(|| format!("Episode {}", request.episode_id));
        let outcome = self
            .history
            .record(&item, &label, &request.episode_id)
            .await?;

        info!(episode = %label, ?outcome, "Recorded watch");
        Ok(outcome)
    }
}

fn placeholder_item(request: &WatchRequest) -> MediaItem {
    MediaItem {
        id: request.media_id.clone(),
        title: UNTITLED.to_string(),
        cover: String::new(),
        provider: request.provider,
        kind: None,
        episode_count: None,
        score: None,
    }
}
