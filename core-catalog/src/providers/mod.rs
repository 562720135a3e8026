//! Catalog providers
//!
//! One client per upstream catalog, all speaking to the same API through a
//! shared [`ApiClient`]. Each client normalizes what it fetches before
//! returning it; callers only ever see canonical models.

pub mod anime;
pub mod client;
pub mod dramabox;
pub mod melolo;
pub mod netshort;

pub use anime::AnimeClient;
pub use client::ApiClient;
pub use dramabox::DramaBoxClient;
pub use melolo::MeloloClient;
pub use netshort::NetShortClient;

use crate::error::{CatalogError, Result};
use crate::models::{find_episode, Episode, MediaDetail, MediaItem, Provider};
use async_trait::async_trait;

/// Operations every catalog provider answers.
///
/// Operations a provider has no endpoint for return
/// [`CatalogError::Unsupported`].
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Title of this provider's home feed section.
    fn featured_title(&self) -> &'static str;

    /// Listing shown in the home feed section.
    async fn featured(&self) -> Result<Vec<MediaItem>>;

    async fn latest(&self) -> Result<Vec<MediaItem>> {
        Err(unsupported(self.provider(), "latest"))
    }

    async fn trending(&self) -> Result<Vec<MediaItem>> {
        Err(unsupported(self.provider(), "trending"))
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>>;

    async fn detail(&self, id: &str) -> Result<MediaDetail>;

    async fn episodes(&self, id: &str) -> Result<Vec<Episode>> {
        Ok(self.detail(id).await?.episodes)
    }

    /// Resolves a playable URL for one episode of a title.
    async fn stream_url(&self, id: &str, episode_id: &str) -> Result<String>;
}

pub(crate) fn unsupported(provider: Provider, operation: &'static str) -> CatalogError {
    CatalogError::Unsupported {
        provider,
        operation,
    }
}

/// Picks `episode_id` out of `episodes` and returns its inline stream URL.
pub(crate) fn stream_from_episodes(
    provider: Provider,
    media_id: &str,
    episode_id: &str,
    episodes: &[Episode],
) -> Result<String> {
    let episode = find_episode(episodes, episode_id).ok_or_else(|| CatalogError::EpisodeNotFound {
        provider,
        media_id: media_id.to_string(),
        episode_id: episode_id.to_string(),
    })?;

    episode
        .url
        .clone()
        .ok_or_else(|| CatalogError::StreamUnavailable {
            provider,
            media_id: media_id.to_string(),
            episode_id: episode_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(id: &str, number: u32, url: Option<&str>) -> Episode {
        Episode {
            id: id.to_string(),
            title: format!("Episode {}", number),
            number: Some(number),
            url: url.map(str::to_string),
            cover: None,
            duration: None,
        }
    }

    #[test]
    fn test_stream_from_episodes() {
        let episodes = vec![
            episode("c1", 1, Some("https://cdn.example.com/1.m3u8")),
            episode("c2", 2, None),
        ];

        assert_eq!(
            stream_from_episodes(Provider::DramaBox, "41", "1", &episodes).unwrap(),
            "https://cdn.example.com/1.m3u8"
        );
        assert!(matches!(
            stream_from_episodes(Provider::DramaBox, "41", "c2", &episodes),
            Err(CatalogError::StreamUnavailable { .. })
        ));
        assert!(matches!(
            stream_from_episodes(Provider::DramaBox, "41", "7", &episodes),
            Err(CatalogError::EpisodeNotFound { .. })
        ));
    }
}
