//! NetShort client
//!
//! NetShort exposes listings and a per-title episode list but no detail
//! endpoint, so details are synthesized from the episode list.

use super::client::{encode, ApiClient};
use super::{stream_from_episodes, CatalogProvider};
use crate::error::Result;
use crate::models::{Episode, MediaDetail, MediaItem, Provider};
use crate::normalize::items_from_values;
use crate::normalize::netshort::{normalize_detail, normalize_episodes, normalize_item};
use async_trait::async_trait;
use serde_json::Value;

const PROVIDER: Provider = Provider::NetShort;

pub struct NetShortClient {
    api: ApiClient,
}

impl NetShortClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn listing(&self, operation: &'static str, path: &str) -> Result<Vec<MediaItem>> {
        let entries = self.api.get_list(PROVIDER, operation, path).await?;
        Ok(items_from_values(&entries, normalize_item))
    }

    pub async fn theaters(&self) -> Result<Vec<MediaItem>> {
        self.listing("theaters", "/netshort/theaters").await
    }

    pub async fn for_you(&self) -> Result<Vec<MediaItem>> {
        self.listing("for_you", "/netshort/foryou").await
    }

    async fn raw_episodes(&self, id: &str) -> Result<Vec<Value>> {
        let path = format!("/netshort/allepisode?drama_id={}", encode(id));
        self.api.get_list(PROVIDER, "episodes", &path).await
    }
}

#[async_trait]
impl CatalogProvider for NetShortClient {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn featured_title(&self) -> &'static str {
        "NetShort For You"
    }

    async fn featured(&self) -> Result<Vec<MediaItem>> {
        self.for_you().await
    }

    async fn latest(&self) -> Result<Vec<MediaItem>> {
        self.theaters().await
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let path = format!("/netshort/search?query={}", encode(query));
        self.listing("search", &path).await
    }

    async fn detail(&self, id: &str) -> Result<MediaDetail> {
        let entries = self.raw_episodes(id).await?;
        Ok(normalize_detail(id.trim(), &entries))
    }

    async fn episodes(&self, id: &str) -> Result<Vec<Episode>> {
        let entries = self.raw_episodes(id).await?;
        Ok(normalize_episodes(&entries))
    }

    async fn stream_url(&self, id: &str, episode_id: &str) -> Result<String> {
        let episodes = self.episodes(id).await?;
        stream_from_episodes(PROVIDER, id, episode_id, &episodes)
    }
}
