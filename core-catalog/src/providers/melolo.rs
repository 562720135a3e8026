//! Melolo client
//!
//! Melolo resolves streams per episode through `/melolo/stream`.

use super::client::{encode, ApiClient};
use super::CatalogProvider;
use crate::error::{CatalogError, Result};
use crate::models::{MediaDetail, MediaItem, Provider};
use crate::normalize::items_from_values;
use crate::normalize::melolo::{normalize_detail, normalize_item, stream_url};
use async_trait::async_trait;

const PROVIDER: Provider = Provider::Melolo;

pub struct MeloloClient {
    api: ApiClient,
}

impl MeloloClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn listing(&self, operation: &'static str, path: &str) -> Result<Vec<MediaItem>> {
        let entries = self.api.get_list(PROVIDER, operation, path).await?;
        Ok(items_from_values(&entries, normalize_item))
    }
}

#[async_trait]
impl CatalogProvider for MeloloClient {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn featured_title(&self) -> &'static str {
        "Popular on Melolo"
    }

    async fn featured(&self) -> Result<Vec<MediaItem>> {
        self.trending().await
    }

    async fn latest(&self) -> Result<Vec<MediaItem>> {
        self.listing("latest", "/melolo/latest").await
    }

    async fn trending(&self) -> Result<Vec<MediaItem>> {
        self.listing("trending", "/melolo/trending").await
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let path = format!("/melolo/search?query={}", encode(query));
        self.listing("search", &path).await
    }

    async fn detail(&self, id: &str) -> Result<MediaDetail> {
        let path = format!("/melolo/detail?id={}", encode(id));
        let payload = self.api.get_json(PROVIDER, "detail", &path).await?;

        let mut detail = normalize_detail(&payload);
        detail.item.id = id.trim().to_string();
        Ok(detail)
    }

    async fn stream_url(&self, id: &str, episode_id: &str) -> Result<String> {
        let path = format!(
            "/melolo/stream?id={}&episode={}",
            encode(id),
            encode(episode_id)
        );
        let payload = self.api.get_json(PROVIDER, "stream_url", &path).await?;

        stream_url(&payload).ok_or_else(|| CatalogError::StreamUnavailable {
            provider: PROVIDER,
            media_id: id.to_string(),
            episode_id: episode_id.to_string(),
        })
    }
}
