//! Anime client
//!
//! Titles and episodes are addressed by page URLs on the anime site. Callers
//! may pass either the full page URL or just the slug used as the canonical
//! id; slugs are expanded against the configured site base.

use super::client::{encode, ApiClient};
use super::CatalogProvider;
use crate::error::{CatalogError, Result};
use crate::models::{find_episode, MediaDetail, MediaItem, Provider};
use crate::normalize::anime::{
    media_id, normalize_detail, normalize_item, normalize_movie, page_url, video_url,
};
use crate::normalize::items_from_values;
use async_trait::async_trait;

const PROVIDER: Provider = Provider::Anime;

pub struct AnimeClient {
    api: ApiClient,
    site_base: String,
}

impl AnimeClient {
    pub fn new(api: ApiClient, site_base: impl Into<String>) -> Self {
        Self {
            api,
            site_base: site_base.into(),
        }
    }

    /// Anime movies.
    pub async fn movies(&self) -> Result<Vec<MediaItem>> {
        let entries = self.api.get_list(PROVIDER, "movies", "/anime/movie").await?;
        Ok(items_from_values(&entries, normalize_movie))
    }

    /// Resolves the playable URL behind an episode page.
    pub async fn video(&self, episode_url: &str) -> Result<Option<String>> {
        let path = format!("/anime/getvideo?url={}", encode(episode_url));
        let payload = self.api.get_json(PROVIDER, "video", &path).await?;
        Ok(video_url(&payload))
    }

    fn is_page_url(id: &str) -> bool {
        let id = id.trim();
        id.starts_with("http://") || id.starts_with("https://")
    }
}

#[async_trait]
impl CatalogProvider for AnimeClient {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn featured_title(&self) -> &'static str {
        "Anime Updates"
    }

    async fn featured(&self) -> Result<Vec<MediaItem>> {
        self.latest().await
    }

    async fn latest(&self) -> Result<Vec<MediaItem>> {
        let entries = self.api.get_list(PROVIDER, "latest", "/anime/latest").await?;
        Ok(items_from_values(&entries, normalize_item))
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let path = format!("/anime/search?query={}", encode(query));
        let entries = self.api.get_list(PROVIDER, "search", &path).await?;
        Ok(items_from_values(&entries, normalize_item))
    }

    async fn detail(&self, id: &str) -> Result<MediaDetail> {
        let url = page_url(&self.site_base, id);
        let path = format!("/anime/detail?url={}", encode(&url));
        let payload = self.api.get_json(PROVIDER, "detail", &path).await?;

        let mut detail = normalize_detail(&payload);
        detail.item.id = media_id(id);
        Ok(detail)
    }

    async fn stream_url(&self, id: &str, episode_id: &str) -> Result<String> {
        let episode_url = if Self::is_page_url(episode_id) {
            episode_id.trim().to_string()
        } else {
            let detail = self.detail(id).await?;
            find_episode(&detail.episodes, episode_id)
                .map(|episode| episode.id.clone())
                .ok_or_else(|| CatalogError::EpisodeNotFound {
                    provider: PROVIDER,
                    media_id: id.to_string(),
                    episode_id: episode_id.to_string(),
                })?
        };

        self.video(&episode_url)
            .await?
            .ok_or_else(|| CatalogError::StreamUnavailable {
                provider: PROVIDER,
                media_id: id.to_string(),
                episode_id: episode_id.to_string(),
            })
    }
}
