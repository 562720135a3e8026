//! Melolo records.

use super::{
    as_record, detail_from_fields, episodes_from_values, item_from_record, resolved_url,
    DetailAliases, DetailFields, EpisodeAliases, ItemAliases, DEFAULT_EPISODE_ALIASES,
};
use crate::models::{Episode, MediaDetail, MediaItem, MediaKind, Provider};
use crate::normalize::fields::unwrap_record;
use serde_json::Value;

pub const ITEM_ALIASES: ItemAliases = ItemAliases {
    id: &["id", "book_id", "series_id"],
    url: &["url", "link"],
    title: &["title", "book_name", "name"],
    cover: &["cover", "thumb_url", "image"],
    episode_count: &["total_episode", "episode_count", "serial_count"],
    score: &["score", "rating"],
};

pub const DETAIL_ALIASES: DetailAliases = DetailAliases {
    synopsis: &["synopsis", "abstract", "description", "intro"],
    release_date: &["release_date", "create_time", "year"],
    status: &["status", "serial_status"],
    genres: &["genres", "tags", "category", "stat_infos"],
    episodes: &["episodes", "episode_list", "video_list", "data.episodes"],
    related: &["related", "recommend_list"],
};

pub const EPISODE_ALIASES: EpisodeAliases = EpisodeAliases {
    id: &["id", "vid", "episode_id"],
    number: &["episode", "vid_index", "episode_number"],
    ..DEFAULT_EPISODE_ALIASES
};

/// Keys a stream-resolution response may carry its URL under.
pub const STREAM_URL_ALIASES: &[&str] = &["url", "streamUrl", "data.url"];

pub fn normalize_item(value: &Value) -> MediaItem {
    item_from_record(&as_record(value), Provider::Melolo, &ITEM_ALIASES, Some(MediaKind::Drama))
}

pub fn normalize_detail(value: &Value) -> MediaDetail {
    let Some(record) = unwrap_record(value, ITEM_ALIASES.id) else {
        return MediaDetail::from_item(normalize_item(value));
    };
    let item = item_from_record(record, Provider::Melolo, &ITEM_ALIASES, Some(MediaKind::Drama));
    let fields = DetailFields::extract(record, &DETAIL_ALIASES);
    detail_from_fields(item, fields, &EPISODE_ALIASES, normalize_item)
}

pub fn normalize_episodes(values: &[Value]) -> Vec<Episode> {
    episodes_from_values(values, &EPISODE_ALIASES)
}

/// Stream URL out of a `/melolo/stream` response.
pub fn stream_url(value: &Value) -> Option<String> {
    resolved_url(value, STREAM_URL_ALIASES)
}
