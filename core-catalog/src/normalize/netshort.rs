//! NetShort records.
//!
//! NetShort has no detail endpoint; a detail is synthesized from the episode
//! list with a placeholder title.

use super::{
    as_record, episodes_from_values, item_from_record, EpisodeAliases, ItemAliases,
    DEFAULT_EPISODE_ALIASES,
};
use crate::models::{Episode, MediaDetail, MediaItem, MediaKind, Provider};
use serde_json::Value;

pub const ITEM_ALIASES: ItemAliases = ItemAliases {
    id: &["drama_id", "shortPlayId", "id"],
    url: &["url", "link"],
    title: &["title", "shortPlayName", "name"],
    cover: &["cover", "shortPlayCover", "image"],
    episode_count: &["total_episode", "episode_count"],
    score: &["score", "rating"],
};

pub const EPISODE_ALIASES: EpisodeAliases = EpisodeAliases {
    id: &["episode_id", "episodeId", "id"],
    number: &["episode", "episodeNo", "episode_number"],
    ..DEFAULT_EPISODE_ALIASES
};

pub fn normalize_item(value: &Value) -> MediaItem {
    item_from_record(&as_record(value), Provider::NetShort, &ITEM_ALIASES, Some(MediaKind::Drama))
}

pub fn normalize_episodes(values: &[Value]) -> Vec<Episode> {
    episodes_from_values(values, &EPISODE_ALIASES)
}

/// Builds the detail view of `drama_id` from its raw episode list.
pub fn normalize_detail(drama_id: &str, episodes: &[Value]) -> MediaDetail {
    let episodes = normalize_episodes(episodes);
    let item = MediaItem {
        id: drama_id.to_string(),
        title: format!("Drama {}", drama_id),
        cover: String::new(),
        provider: Provider::NetShort,
        kind: Some(MediaKind::Drama),
        episode_count: u32::try_from(episodes.len()).ok().filter(|n| *n > 0),
        score: None,
    };

    MediaDetail {
        episodes,
        ..MediaDetail::from_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_uses_drama_id() {
        let item = normalize_item(&json!({
            "drama_id": 1882,
            "shortPlayName": "Istri Rahasia CEO",
            "shortPlayCover": "https://img.example.com/ns.jpg",
        }));
        assert_eq!(item.id, "1882");
        assert_eq!(item.title, "Istri Rahasia CEO");
        assert_eq!(item.cover, "https://img.example.com/ns.jpg");
        assert_eq!(item.provider, Provider::NetShort);
    }

    #[test]
    fn test_synthesized_detail() {
        let detail = normalize_detail(
            "1882",
            &[
                json!({ "drama_id": 1882, "episode": 1, "url": "https://cdn.example.com/1.mp4" }),
                json!({ "drama_id": 1882, "episode": 2 }),
            ],
        );

        assert_eq!(detail.item.title, "Drama 1882");
        assert_eq!(detail.item.cover, "");
        assert_eq!(detail.item.episode_count, Some(2));
        assert_eq!(detail.episodes[0].id, "1");
        assert_eq!(detail.episodes[1].number, Some(2));
        assert!(detail.episodes[1].url.is_none());
    }
}
