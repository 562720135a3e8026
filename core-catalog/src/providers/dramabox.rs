//! DramaBox client
//!
//! ## Endpoints
//!
//! - `/dramabox/latest`, `/dramabox/trending`, `/dramabox/randomdrama`,
//!   `/dramabox/foryou`, `/dramabox/vip`, `/dramabox/dubindo`: listings
//! - `/dramabox/populersearch`: popular search terms
//! - `/dramabox/search?query={q}`
//! - `/dramabox/detail?id={id}`: detail, usually with inline episodes
//! - `/dramabox/allepisode?id={id}`: full episode list with stream URLs

use super::client::{encode, ApiClient};
use super::{stream_from_episodes, CatalogProvider};
use crate::error::Result;
use crate::models::{Episode, MediaDetail, MediaItem, Provider};
use crate::normalize::dramabox::{has_inline_episodes, normalize_detail, normalize_episodes, normalize_item};
use crate::normalize::fields::{first_text, scalar_text};
use crate::normalize::items_from_values;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const PROVIDER: Provider = Provider::DramaBox;

pub struct DramaBoxClient {
    api: ApiClient,
}

impl DramaBoxClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn listing(&self, operation: &'static str, path: &str) -> Result<Vec<MediaItem>> {
        let entries = self.api.get_list(PROVIDER, operation, path).await?;
        Ok(items_from_values(&entries, normalize_item))
    }

    pub async fn random(&self) -> Result<Vec<MediaItem>> {
        self.listing("random", "/dramabox/randomdrama").await
    }

    pub async fn for_you(&self) -> Result<Vec<MediaItem>> {
        self.listing("for_you", "/dramabox/foryou").await
    }

    pub async fn vip(&self) -> Result<Vec<MediaItem>> {
        self.listing("vip", "/dramabox/vip").await
    }

    pub async fn dub_indo(&self) -> Result<Vec<MediaItem>> {
        self.listing("dub_indo", "/dramabox/dubindo").await
    }

    /// Popular search keywords.
    pub async fn popular_searches(&self) -> Result<Vec<String>> {
        let entries = self
            .api
            .get_list(PROVIDER, "popular_searches", "/dramabox/populersearch")
            .await?;

        Ok(entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(record) => first_text(record, &["keyword", "title", "name"]),
                other => scalar_text(other),
            })
            .collect())
    }

    async fn episode_list(&self, id: &str) -> Result<Vec<Episode>> {
        let path = format!("/dramabox/allepisode?id={}", encode(id));
        let entries = self.api.get_list(PROVIDER, "episodes", &path).await?;
        Ok(normalize_episodes(&entries))
    }
}

#[async_trait]
impl CatalogProvider for DramaBoxClient {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn featured_title(&self) -> &'static str {
        "DramaBox Latest"
    }

    async fn featured(&self) -> Result<Vec<MediaItem>> {
        self.latest().await
    }

    async fn latest(&self) -> Result<Vec<MediaItem>> {
        self.listing("latest", "/dramabox/latest").await
    }

    async fn trending(&self) -> Result<Vec<MediaItem>> {
        self.listing("trending", "/dramabox/trending").await
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let path = format!("/dramabox/search?query={}", encode(query));
        self.listing("search", &path).await
    }

    async fn detail(&self, id: &str) -> Result<MediaDetail> {
        let path = format!("/dramabox/detail?id={}", encode(id));
        let payload = self.api.get_json(PROVIDER, "detail", &path).await?;

        let mut detail = normalize_detail(&payload);
        detail.item.id = id.trim().to_string();

        if !has_inline_episodes(&payload) {
            debug!(id, "DramaBox detail has no inline episodes, fetching episode list");
            detail.episodes = self.episode_list(id).await?;
        }
        Ok(detail)
    }

    async fn episodes(&self, id: &str) -> Result<Vec<Episode>> {
        self.episode_list(id).await
    }

    async fn stream_url(&self, id: &str, episode_id: &str) -> Result<String> {
        let episodes = self.episode_list(id).await?;
        stream_from_episodes(PROVIDER, id, episode_id, &episodes)
    }
}
