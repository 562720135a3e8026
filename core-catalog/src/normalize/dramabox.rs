//! DramaBox records.

use super::{
    as_record, detail_from_fields, episodes_from_values, item_from_record, DetailAliases,
    DetailFields, EpisodeAliases, ItemAliases, DEFAULT_EPISODE_ALIASES, EPISODE_LIST_ALIASES,
};
use crate::models::{Episode, MediaDetail, MediaItem, MediaKind, Provider};
use crate::normalize::fields::unwrap_record;
use serde_json::Value;

pub const ITEM_ALIASES: ItemAliases = ItemAliases {
    id: &["id", "bookId", "book_id", "drama_id"],
    url: &["url", "link", "shareUrl"],
    title: &["title", "bookName", "name"],
    cover: &["cover", "coverWap", "thumbnail", "image"],
    episode_count: &["total_episode", "chapterCount", "episode_count"],
    score: &["score", "rating", "rate"],
};

pub const DETAIL_ALIASES: DetailAliases = DetailAliases {
    synopsis: &["synopsis", "introduction", "description", "desc"],
    release_date: &["release_date", "releaseDate", "shelfTime", "year"],
    status: &["status", "bookStatus"],
    genres: &["genres", "tags", "tagNames", "genre"],
    episodes: EPISODE_LIST_ALIASES,
    related: &["related", "recommendations", "recommend"],
};

pub const EPISODE_ALIASES: EpisodeAliases = DEFAULT_EPISODE_ALIASES;

pub fn normalize_item(value: &Value) -> MediaItem {
    item_from_record(&as_record(value), Provider::DramaBox, &ITEM_ALIASES, Some(MediaKind::Drama))
}

pub fn normalize_detail(value: &Value) -> MediaDetail {
    let Some(record) = unwrap_record(value, ITEM_ALIASES.id) else {
        return MediaDetail::from_item(normalize_item(value));
    };
    let item = item_from_record(record, Provider::DramaBox, &ITEM_ALIASES, Some(MediaKind::Drama));
    let fields = DetailFields::extract(record, &DETAIL_ALIASES);
    detail_from_fields(item, fields, &EPISODE_ALIASES, normalize_item)
}

pub fn normalize_episodes(values: &[Value]) -> Vec<Episode> {
    episodes_from_values(values, &EPISODE_ALIASES)
}

/// Whether a raw detail payload already carries a non-empty episode list.
pub fn has_inline_episodes(value: &Value) -> bool {
    unwrap_record(value, ITEM_ALIASES.id)
        .map(|record| DetailFields::extract(record, &DETAIL_ALIASES).has_inline_episodes())
        .unwrap_or(false)
}
