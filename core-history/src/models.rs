use core_catalog::{MediaItem, MediaKey, Provider};
use serde::{Deserialize, Serialize};

/// One title in the continue-watching log.
///
/// Serialized flat: the media item's fields sit next to the progress fields.
/// Logs written by the web client use `lastEpisode` and `timestamp`; both are
/// accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub item: MediaItem,
    /// Human-readable label of the last episode watched
    #[serde(alias = "lastEpisode")]
    pub last_episode_label: String,
    pub last_episode_id: String,
    /// When the episode was started, in Unix milliseconds
    #[serde(alias = "timestamp")]
    pub watched_at_epoch_ms: i64,
}

impl HistoryEntry {
    pub fn key(&self) -> MediaKey {
        self.item.key()
    }

    pub fn is(&self, provider: Provider, id: &str) -> bool {
        self.item.is(provider, id)
    }
}

/// Result of [`record`](crate::HistoryRepository::record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new entry was written at the front of the log.
    Recorded,
    /// The most recent entry already pointed at this episode; nothing was written.
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_web_client_entries() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": "41000102",
            "title": "Sang Pewaris",
            "cover": "https://img.example.com/c.jpg",
            "provider": "dramabox",
            "lastEpisode": "Episode 3",
            "lastEpisodeId": "3",
            "timestamp": 1_767_000_000_000i64,
        }))
        .unwrap();

        assert!(entry.is(Provider::DramaBox, "41000102"));
        assert_eq!(entry.last_episode_label, "Episode 3");
        assert_eq!(entry.watched_at_epoch_ms, 1_767_000_000_000);
    }

    #[test]
    fn test_writes_flat_camel_case() {
        let entry = HistoryEntry {
            item: MediaItem {
                id: "7".to_string(),
                title: "Menantu".to_string(),
                cover: String::new(),
                provider: Provider::Melolo,
                kind: None,
                episode_count: None,
                score: None,
            },
            last_episode_label: "Episode 1".to_string(),
            last_episode_id: "v-1".to_string(),
            watched_at_epoch_ms: 5,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["provider"], "melolo");
        assert_eq!(json["lastEpisodeLabel"], "Episode 1");
        assert_eq!(json["watchedAtEpochMs"], 5);
        assert!(json.get("item").is_none());
    }
}
