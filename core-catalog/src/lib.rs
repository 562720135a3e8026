//! # Catalog Module
//!
//! Queries the drama and anime catalogs behind the streaming API and turns
//! their inconsistent payloads into one canonical model.
//!
//! ## Overview
//!
//! This module handles:
//! - Normalizing provider records through per-provider alias tables
//! - One client per provider (DramaBox, NetShort, Melolo, Anime)
//! - Fan-out search and home feed across all providers with partial-failure
//!   tolerance
//! - Caching successful list answers for a configurable stale time

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod models;
pub mod normalize;
pub mod providers;

pub use aggregate::{AggregateResult, CacheSettings, CatalogAggregator};
pub use error::{CatalogError, ProviderFailure, Result};
pub use models::{
    Episode, FeedSection, HomeFeed, MediaDetail, MediaItem, MediaKey, MediaKind, Provider,
};
pub use providers::{
    AnimeClient, ApiClient, CatalogProvider, DramaBoxClient, MeloloClient, NetShortClient,
};
