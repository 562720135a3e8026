//! Per-provider normalization of raw catalog payloads into the canonical model.
//!
//! Each provider module owns an alias table (which upstream keys feed which
//! canonical field, first match wins) and exposes the same three total
//! functions: `normalize_item`, `normalize_detail` and `normalize_episodes`.
//! None of them can fail; missing data degrades to documented defaults.

pub mod anime;
pub mod dramabox;
pub mod fields;
pub mod melolo;
pub mod netshort;

pub use fields::{list_entries, RawRecord, UNTITLED};

use crate::models::{Episode, MediaDetail, MediaItem, MediaKind, Provider};
use fields::{first_count, first_labels, first_list, first_text, resolve_id};
use serde_json::Value;

/// Alias table for the listing fields of a provider's records.
#[derive(Debug, Clone, Copy)]
pub struct ItemAliases {
    pub id: &'static [&'static str],
    pub url: &'static [&'static str],
    pub title: &'static [&'static str],
    pub cover: &'static [&'static str],
    pub episode_count: &'static [&'static str],
    pub score: &'static [&'static str],
}

/// Alias table for episode records.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeAliases {
    pub id: &'static [&'static str],
    pub number: &'static [&'static str],
    pub title: &'static [&'static str],
    pub url: &'static [&'static str],
    pub cover: &'static [&'static str],
    pub duration: &'static [&'static str],
}

/// Alias table for the detail-only fields.
#[derive(Debug, Clone, Copy)]
pub struct DetailAliases {
    pub synopsis: &'static [&'static str],
    pub release_date: &'static [&'static str],
    pub status: &'static [&'static str],
    pub genres: &'static [&'static str],
    pub episodes: &'static [&'static str],
    pub related: &'static [&'static str],
}

/// Episode aliases shared by every provider unless it overrides them.
pub const DEFAULT_EPISODE_ALIASES: EpisodeAliases = EpisodeAliases {
    id: &["id", "episode_id", "chapterId", "chapter_id", "vid"],
    number: &["episode", "episode_number", "episodeNo", "chapterIndex"],
    title: &["title", "name", "chapterName", "episode_title"],
    url: &["url", "video_url", "videoUrl", "stream_url", "play_url", "m3u8"],
    cover: &["cover", "thumbnail", "image", "chapterImg"],
    duration: &["duration", "length", "runtime"],
};

/// Where inline episode lists are found in a detail record.
pub const EPISODE_LIST_ALIASES: &[&str] =
    &["episodes", "episode_list", "chapterList", "data.episodes"];

/// The consumed fields of a detail record.
///
/// Built once from the alias chain; everything downstream reads these
/// fields instead of probing the raw record.
#[derive(Debug, Clone, Default)]
pub struct DetailFields<'a> {
    pub synopsis: Option<String>,
    pub release_date: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub episodes: Option<&'a [Value]>,
    pub related: Option<&'a [Value]>,
}

impl<'a> DetailFields<'a> {
    pub fn extract(record: &'a RawRecord, aliases: &DetailAliases) -> Self {
        Self {
            synopsis: first_text(record, aliases.synopsis),
            release_date: first_text(record, aliases.release_date),
            status: first_text(record, aliases.status),
            genres: first_labels(record, aliases.genres),
            episodes: first_list(record, aliases.episodes),
            related: first_list(record, aliases.related),
        }
    }

    /// Whether the record carried a usable inline episode list.
    pub fn has_inline_episodes(&self) -> bool {
        self.episodes.is_some_and(|episodes| !episodes.is_empty())
    }
}

/// Views a JSON value as a record; anything but an object reads as empty.
pub(crate) fn as_record(value: &Value) -> std::borrow::Cow<'_, RawRecord> {
    match value.as_object() {
        Some(record) => std::borrow::Cow::Borrowed(record),
        None => std::borrow::Cow::Owned(RawRecord::new()),
    }
}

pub(crate) fn item_from_record(
    record: &RawRecord,
    provider: Provider,
    aliases: &ItemAliases,
    kind: Option<MediaKind>,
) -> MediaItem {
    MediaItem {
        id: resolve_id(record, aliases.id, aliases.url),
        title: first_text(record, aliases.title).unwrap_or_else(|| UNTITLED.to_string()),
        cover: first_text(record, aliases.cover).unwrap_or_default(),
        provider,
        kind,
        episode_count: first_count(record, aliases.episode_count),
        score: first_text(record, aliases.score),
    }
}

/// Normalizes one episode record found at `position` (0-based).
pub(crate) fn episode_from_record(
    record: &RawRecord,
    position: usize,
    aliases: &EpisodeAliases,
) -> Episode {
    let ordinal = u32::try_from(position + 1).unwrap_or(u32::MAX);
    let number = first_count(record, aliases.number);
    let label = number.unwrap_or(ordinal);

    Episode {
        id: first_text(record, aliases.id).unwrap_or_else(|| ordinal.to_string()),
        title: first_text(record, aliases.title)
            .unwrap_or_else(|| format!("Episode {}", label)),
        number: Some(label),
        url: first_text(record, aliases.url),
        cover: first_text(record, aliases.cover),
        duration: first_text(record, aliases.duration),
    }
}

/// Normalizes a list of episode records, skipping entries that are not
/// objects. Positions count every entry so numbering matches the upstream
/// list.
pub(crate) fn episodes_from_values(values: &[Value], aliases: &EpisodeAliases) -> Vec<Episode> {
    values
        .iter()
        .enumerate()
        .filter_map(|(position, value)| {
            value
                .as_object()
                .map(|record| episode_from_record(record, position, aliases))
        })
        .collect()
}

/// Normalizes a list of listing records with `normalize`, skipping entries
/// that are not objects.
pub(crate) fn items_from_values(values: &[Value], normalize: fn(&Value) -> MediaItem) -> Vec<MediaItem> {
    values
        .iter()
        .filter(|value| value.is_object())
        .map(normalize)
        .collect()
}

/// URL carried by a resolution response under one of `aliases`.
pub(crate) fn resolved_url(value: &Value, aliases: &[&str]) -> Option<String> {
    first_text(value.as_object()?, aliases)
}

/// Assembles a detail from its listing fields and extracted detail fields.
pub(crate) fn detail_from_fields(
    item: MediaItem,
    fields: DetailFields<'_>,
    episode_aliases: &EpisodeAliases,
    normalize_related: fn(&Value) -> MediaItem,
) -> MediaDetail {
    let episodes = fields
        .episodes
        .map(|values| episodes_from_values(values, episode_aliases))
        .unwrap_or_default();
    let related = fields
        .related
        .map(|values| items_from_values(values, normalize_related))
        .unwrap_or_default();

    MediaDetail {
        item,
        synopsis: fields.synopsis,
        release_date: fields.release_date,
        status: fields.status,
        genres: fields.genres,
        episodes,
        related,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_episode_fallbacks_use_position() {
        let values = vec![json!({}), json!("garbage"), json!({ "title": "Finale", "duration": 95 })];
        let episodes = episodes_from_values(&values, &DEFAULT_EPISODE_ALIASES);

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].id, "1");
        assert_eq!(episodes[0].title, "Episode 1");
        assert_eq!(episodes[1].id, "3");
        assert_eq!(episodes[1].title, "Finale");
        assert_eq!(episodes[1].duration.as_deref(), Some("95"));
    }

    #[test]
    fn test_episode_number_drives_default_title() {
        let record = json!({ "episode": 12, "videoUrl": "https://cdn.example.com/12.m3u8" });
        let episode = episode_from_record(record.as_object().unwrap(), 0, &DEFAULT_EPISODE_ALIASES);

        assert_eq!(episode.title, "Episode 12");
        assert_eq!(episode.number, Some(12));
        assert_eq!(episode.url.as_deref(), Some("https://cdn.example.com/12.m3u8"));
    }

    #[test]
    fn test_detail_fields_inline_episodes() {
        let aliases = DetailAliases {
            synopsis: &["synopsis"],
            release_date: &[],
            status: &[],
            genres: &[],
            episodes: EPISODE_LIST_ALIASES,
            related: &[],
        };
        let empty = json!({ "episodes": [] });
        let nested = json!({ "data": { "episodes": [{ "id": "a" }] } });

        let fields = DetailFields::extract(empty.as_object().unwrap(), &aliases);
        assert!(!fields.has_inline_episodes());

        let fields = DetailFields::extract(nested.as_object().unwrap(), &aliases);
        assert!(fields.has_inline_episodes());
    }
}
