//! Anime records.
//!
//! Anime titles are addressed by their page URL on the anime site. The
//! canonical id is that URL's last path segment (the slug); episode ids keep
//! the full episode page URL, which is what video resolution expects.

use super::{
    as_record, detail_from_fields, episodes_from_values, resolved_url, DetailAliases,
    DetailFields, EpisodeAliases, ItemAliases, DEFAULT_EPISODE_ALIASES, UNTITLED,
};
use crate::models::{Episode, MediaDetail, MediaItem, MediaKind, Provider};
use crate::normalize::fields::{
    derived_id, first_count, first_text, last_path_segment, unwrap_record, RawRecord,
};
use serde_json::Value;

pub const ITEM_ALIASES: ItemAliases = ItemAliases {
    id: &["id", "slug"],
    url: &["url", "link", "endpoint"],
    title: &["title", "judul", "name"],
    cover: &["image", "thumbnail", "poster", "cover"],
    episode_count: &["total_episode", "episode_count", "episodes"],
    score: &["score", "rating"],
};

pub const DETAIL_ALIASES: DetailAliases = DetailAliases {
    synopsis: &["synopsis", "sinopsis", "description"],
    release_date: &["release_date", "tanggal_rilis", "aired", "released"],
    status: &["status"],
    genres: &["genres", "genre", "genre_list"],
    episodes: &["episodes", "episode_list", "episodeList", "data.episodes"],
    related: &["recommendations", "related"],
};

pub const EPISODE_ALIASES: EpisodeAliases = EpisodeAliases {
    id: &["url", "link", "episode_url", "id"],
    number: &["episode", "eps", "episode_number"],
    title: &["title", "judul", "episode_title", "name"],
    url: &["stream_url", "video_url", "videoUrl"],
    ..DEFAULT_EPISODE_ALIASES
};

/// Keys a video-resolution response may carry its URL under.
pub const VIDEO_URL_ALIASES: &[&str] = &["url", "videoUrl", "data.url"];

/// Id for an anime record: the page URL's slug, then an explicit id, then a
/// content hash.
fn anime_id(record: &RawRecord) -> String {
    first_text(record, ITEM_ALIASES.url)
        .and_then(|url| last_path_segment(&url))
        .or_else(|| first_text(record, ITEM_ALIASES.id))
        .unwrap_or_else(|| derived_id(record))
}

fn item_with_kind(record: &RawRecord, kind: MediaKind) -> MediaItem {
    MediaItem {
        id: anime_id(record),
        title: first_text(record, ITEM_ALIASES.title).unwrap_or_else(|| UNTITLED.to_string()),
        cover: first_text(record, ITEM_ALIASES.cover).unwrap_or_default(),
        provider: Provider::Anime,
        kind: Some(kind),
        episode_count: first_count(record, ITEM_ALIASES.episode_count),
        score: first_text(record, ITEM_ALIASES.score),
    }
}

pub fn normalize_item(value: &Value) -> MediaItem {
    item_with_kind(&as_record(value), MediaKind::Video)
}

/// Listing entry from the movie endpoint.
pub fn normalize_movie(value: &Value) -> MediaItem {
    item_with_kind(&as_record(value), MediaKind::Movie)
}

pub fn normalize_detail(value: &Value) -> MediaDetail {
    let identity: Vec<&str> = ITEM_ALIASES.url.iter().chain(ITEM_ALIASES.id).copied().collect();
    let Some(record) = unwrap_record(value, &identity) else {
        return MediaDetail::from_item(normalize_item(value));
    };
    let item = item_with_kind(record, MediaKind::Video);
    let fields = DetailFields::extract(record, &DETAIL_ALIASES);
    detail_from_fields(item, fields, &EPISODE_ALIASES, normalize_item)
}

pub fn normalize_episodes(values: &[Value]) -> Vec<Episode> {
    episodes_from_values(values, &EPISODE_ALIASES)
}

/// Playable URL out of a `/anime/getvideo` response.
pub fn video_url(value: &Value) -> Option<String> {
    resolved_url(value, VIDEO_URL_ALIASES)
}

/// Page URL for a title id, which may already be a full URL or just a slug.
pub fn page_url(site_base: &str, id: &str) -> String {
    let id = id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        id.to_string()
    } else {
        format!(
            "{}/anime/{}/",
            site_base.trim_end_matches('/'),
            id.trim_matches('/')
        )
    }
}

/// Canonical id for a title addressed either by slug or by page URL.
pub fn media_id(id: &str) -> String {
    last_path_segment(id).unwrap_or_else(|| id.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_is_url_slug() {
        let item = normalize_item(&json!({
            "id": "ignored",
            "url": "https://otakudesu.cloud/anime/one-piece-sub-indo/",
            "judul": "One Piece",
            "poster": "https://img.example.com/op.jpg",
        }));
        assert_eq!(item.id, "one-piece-sub-indo");
        assert_eq!(item.title, "One Piece");
        assert_eq!(item.cover, "https://img.example.com/op.jpg");
        assert_eq!(item.kind, Some(MediaKind::Video));
    }

    #[test]
    fn test_movie_kind_and_slug_fallback() {
        let movie = normalize_movie(&json!({ "slug": "kimi-no-na-wa", "title": "Your Name" }));
        assert_eq!(movie.id, "kimi-no-na-wa");
        assert_eq!(movie.kind, Some(MediaKind::Movie));
    }

    #[test]
    fn test_episodes_keep_page_url() {
        let detail = normalize_detail(&json!({
            "data": {
                "title": "One Piece",
                "sinopsis": "Bajak laut.",
                "genres": [{ "name": "Action" }],
                "episode_list": [
                    { "title": "Episode 1100", "url": "https://otakudesu.cloud/episode/op-1100/" },
                ],
            }
        }));
        assert_eq!(detail.synopsis.as_deref(), Some("Bajak laut."));
        assert_eq!(detail.genres, vec!["Action"]);
        assert_eq!(detail.episodes[0].id, "https://otakudesu.cloud/episode/op-1100/");
        assert!(detail.episodes[0].url.is_none());
    }

    #[test]
    fn test_page_url_expansion() {
        assert_eq!(
            page_url("https://otakudesu.cloud/", "one-piece-sub-indo"),
            "https://otakudesu.cloud/anime/one-piece-sub-indo/"
        );
        assert_eq!(
            page_url("https://otakudesu.cloud", "https://otakudesu.cloud/anime/x/"),
            "https://otakudesu.cloud/anime/x/"
        );
        assert_eq!(media_id("https://otakudesu.cloud/anime/x/"), "x");
        assert_eq!(media_id("x"), "x");
    }
}
