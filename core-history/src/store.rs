//! Continue-watching log persisted through the settings bridge
//!
//! The whole log lives under a single settings key as a JSON array, most
//! recent first. Every operation is a read-modify-write of that blob under
//! one async mutex, so concurrent callers never interleave.

use crate::error::Result;
use crate::models::{HistoryEntry, RecordOutcome};
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use core_catalog::{MediaItem, Provider};
use core_runtime::config::HistorySettings;
use core_runtime::events::{CoreEvent, EventBus, HistoryEvent};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Watch-history operations.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Records that `episode_id` of `item` was started.
    async fn record(
        &self,
        item: &MediaItem,
        episode_label: &str,
        episode_id: &str,
    ) -> Result<RecordOutcome>;

    /// Removes the entry for `(provider, id)`. Returns whether one existed.
    async fn remove(&self, provider: Provider, id: &str) -> Result<bool>;

    /// All entries, most recent first.
    async fn list(&self) -> Result<Vec<HistoryEntry>>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

/// [`HistoryRepository`] backed by a [`SettingsStore`].
pub struct HistoryStore {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    key: String,
    capacity: usize,
    lock: Mutex<()>,
    events: Option<EventBus>,
}

impl HistoryStore {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        settings: &HistorySettings,
    ) -> Self {
        Self {
            store,
            clock,
            key: settings.storage_key.clone(),
            capacity: settings.capacity.max(1),
            lock: Mutex::new(()),
            events: None,
        }
    }

    /// Publishes history changes on `events`.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reads the log. Must be called with the lock held.
    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        let Some(blob) = self.store.get_string(&self.key).await? else {
            return Ok(Vec::new());
        };

        let values = match serde_json::from_str::<Value>(&blob) {
            Ok(Value::Array(values)) => values,
            Ok(_) => return self.reset("stored history is not a list").await,
            Err(e) => return self.reset(&format!("stored history is not valid JSON: {}", e)).await,
        };

        let total = values.len();
        let mut entries: Vec<HistoryEntry> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<HistoryEntry>(value).ok())
            .filter(|entry| !entry.item.id.is_empty())
            .collect();

        if entries.len() < total {
            warn!(
                dropped = total - entries.len(),
                "Dropped unreadable watch history entries"
            );
        }

        // Hand-edited logs may be out of order or carry duplicates.
        entries.sort_by(|a, b| b.watched_at_epoch_ms.cmp(&a.watched_at_epoch_ms));
        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.key()));
        entries.truncate(self.capacity);

        Ok(entries)
    }

    async fn reset(&self, reason: &str) -> Result<Vec<HistoryEntry>> {
        warn!(key = %self.key, reason, "Resetting watch history");
        self.store.set_string(&self.key, "[]").await?;
        self.publish(HistoryEvent::Reset {
            reason: reason.to_string(),
        });
        Ok(Vec::new())
    }

    async fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let blob = serde_json::to_string(entries)?;
        self.store.set_string(&self.key, &blob).await?;
        Ok(())
    }

    fn publish(&self, event: HistoryEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::History(event));
        }
    }
}

#[async_trait]
impl HistoryRepository for HistoryStore {
    #[instrument(skip(self, item), fields(provider = %item.provider, id = %item.id))]
    async fn record(
        &self,
        item: &MediaItem,
        episode_label: &str,
        episode_id: &str,
    ) -> Result<RecordOutcome> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let already_latest = entries.first().is_some_and(|latest| {
            latest.is(item.provider, &item.id) && latest.last_episode_id == episode_id
        });
        if already_latest {
            debug!("Episode already at the head of the history");
            return Ok(RecordOutcome::Unchanged);
        }

        entries.retain(|entry| !entry.is(item.provider, &item.id));
        entries.insert(
            0,
            HistoryEntry {
                item: item.clone(),
                last_episode_label: episode_label.to_string(),
                last_episode_id: episode_id.to_string(),
                watched_at_epoch_ms: self.clock.unix_timestamp_millis(),
            },
        );
        entries.truncate(self.capacity);
        self.save(&entries).await?;

        self.publish(HistoryEvent::Recorded {
            provider: item.provider.to_string(),
            media_id: item.id.clone(),
            episode_id: episode_id.to_string(),
        });
        Ok(RecordOutcome::Recorded)
    }

    async fn remove(&self, provider: Provider, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let before = entries.len();
        entries.retain(|entry| !entry.is(provider, id));
        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries).await?;
        self.publish(HistoryEvent::Removed {
            provider: provider.to_string(),
            media_id: id.to_string(),
        });
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.delete(&self.key).await?;
        self.publish(HistoryEvent::Cleared);
        Ok(())
    }
}
