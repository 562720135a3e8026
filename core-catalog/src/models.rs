//! Canonical media model shared by every provider.
//!
//! Whatever shape an upstream payload had, by the time it leaves this crate it
//! is one of the types below. Values are plain data: cloneable, comparable and
//! serializable with camelCase keys.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream catalog a title comes from.
///
/// The set is closed; the declaration order is also the fixed priority used
/// when results from several providers are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    DramaBox,
    NetShort,
    Melolo,
    Anime,
}

impl Provider {
    /// All providers in priority order.
    pub const ALL: [Provider; 4] = [
        Provider::DramaBox,
        Provider::NetShort,
        Provider::Melolo,
        Provider::Anime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DramaBox => "dramabox",
            Provider::NetShort => "netshort",
            Provider::Melolo => "melolo",
            Provider::Anime => "anime",
        }
    }

    /// Human-facing name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::DramaBox => "DramaBox",
            Provider::NetShort => "NetShort",
            Provider::Melolo => "Melolo",
            Provider::Anime => "Anime",
        }
    }

    /// Position in the concatenation order, 0 first.
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dramabox" => Ok(Provider::DramaBox),
            "netshort" => Ok(Provider::NetShort),
            "melolo" => Ok(Provider::Melolo),
            "anime" => Ok(Provider::Anime),
            other => Err(CatalogError::UnknownProvider(other.to_string())),
        }
    }
}

/// Broad category of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Drama,
    Video,
    Movie,
}

/// Identity of a title across the catalog: `(provider, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaKey {
    pub provider: Provider,
    pub id: String,
}

impl MediaKey {
    pub fn new(provider: Provider, id: impl Into<String>) -> Self {
        Self {
            provider,
            id: id.into(),
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.id)
    }
}

/// A title as it appears in listings and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Provider-scoped identifier, never empty
    pub id: String,
    pub title: String,
    /// Cover image URL, empty when unknown
    #[serde(default)]
    pub cover: String,
    pub provider: Provider,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl MediaItem {
    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.provider, self.id.clone())
    }

    /// Whether this item has the given `(provider, id)` identity.
    pub fn is(&self, provider: Provider, id: &str) -> bool {
        self.provider == provider && self.id == id
    }
}

/// One playable unit of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Unique within its title
    pub id: String,
    pub title: String,
    /// Episode number as published by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Directly playable stream URL, when the provider embeds one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A title with everything the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetail {
    #[serde(flatten)]
    pub item: MediaItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Always present; empty when the provider has no episode data
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<MediaItem>,
}

impl MediaDetail {
    /// A detail carrying only the listing fields.
    pub fn from_item(item: MediaItem) -> Self {
        Self {
            item,
            synopsis: None,
            release_date: None,
            status: None,
            genres: Vec::new(),
            episodes: Vec::new(),
            related: Vec::new(),
        }
    }

    /// Finds an episode by id, falling back to the published episode number
    /// when the caller passed a number instead.
    pub fn find_episode(&self, episode_id: &str) -> Option<&Episode> {
        find_episode(&self.episodes, episode_id)
    }
}

/// Matches `episode_id` against episode ids first, then episode numbers.
pub fn find_episode<'a>(episodes: &'a [Episode], episode_id: &str) -> Option<&'a Episode> {
    let wanted = episode_id.trim();
    episodes.iter().find(|episode| episode.id == wanted).or_else(|| {
        let number: u32 = wanted.parse().ok()?;
        episodes.iter().find(|episode| episode.number == Some(number))
    })
}

/// One row of the home feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSection {
    pub provider: Provider,
    pub title: String,
    pub items: Vec<MediaItem>,
}

/// The landing screen: a short hero carousel plus one section per provider
/// that answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub hero: Vec<MediaItem>,
    pub sections: Vec<FeedSection>,
}
