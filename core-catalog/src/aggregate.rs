//! Multi-provider aggregation
//!
//! Fan-out queries start every provider call before awaiting any of them and
//! drive them together on the calling task. A provider failure never cancels
//! the others; it is logged, reported in [`AggregateResult::failures`] and
//! published on the event bus. Only when every provider fails does the query
//! itself fail.

use crate::cache::{CacheKey, QueryCache};
use crate::error::{CatalogError, ProviderFailure, Result};
use crate::models::{Episode, FeedSection, HomeFeed, MediaDetail, MediaItem, Provider};
use crate::providers::CatalogProvider;
use bridge_traits::time::Clock;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How many hero slots each provider contributes, in priority order.
const HERO_SLOTS: [(Provider, usize); 4] = [
    (Provider::DramaBox, 2),
    (Provider::NetShort, 1),
    (Provider::Melolo, 1),
    (Provider::Anime, 1),
];

const HERO_LIMIT: usize = 5;

/// Outcome of a fan-out query that at least one provider answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult<T> {
    pub items: T,
    /// Providers that failed, in priority order
    pub failures: Vec<ProviderFailure>,
}

impl<T> AggregateResult<T> {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Cache tuning for [`CatalogAggregator`].
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub capacity: usize,
    pub stale_after: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 64,
            stale_after: Duration::from_secs(5 * 60),
        }
    }
}

pub struct CatalogAggregator {
    /// Sorted by provider priority
    providers: Vec<Arc<dyn CatalogProvider>>,
    lists: QueryCache<Vec<MediaItem>>,
    details: QueryCache<MediaDetail>,
    events: Option<EventBus>,
}

impl CatalogAggregator {
    pub fn new(
        mut providers: Vec<Arc<dyn CatalogProvider>>,
        cache: CacheSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        providers.sort_by_key(|provider| provider.provider().priority());
        providers.dedup_by_key(|provider| provider.provider());

        Self {
            providers,
            lists: QueryCache::new(cache.capacity, cache.stale_after, clock.clone()),
            details: QueryCache::new(cache.capacity, cache.stale_after, clock),
            events: None,
        }
    }

    /// Publishes provider failures and cache hits on `events`.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Single-provider access.
    pub fn provider(&self, provider: Provider) -> Result<&Arc<dyn CatalogProvider>> {
        self.providers
            .iter()
            .find(|candidate| candidate.provider() == provider)
            .ok_or_else(|| CatalogError::UnknownProvider(provider.to_string()))
    }

    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.providers.iter().map(|provider| provider.provider())
    }

    /// Searches every provider and concatenates the hits in priority order.
    ///
    /// A blank query returns an empty result without contacting anyone.
    pub async fn search(&self, query: &str) -> Result<AggregateResult<Vec<MediaItem>>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(AggregateResult {
                items: Vec::new(),
                failures: Vec::new(),
            });
        }

        let outcomes = self
            .fan_out("search", query, |provider| {
                let query = query.to_string();
                async move { provider.search(&query).await }.boxed()
            })
            .await;

        let (answered, failures) = self.partition("search", outcomes)?;
        let items = answered.into_iter().flat_map(|(_, items)| items).collect();
        Ok(AggregateResult { items, failures })
    }

    /// Builds the home feed from each provider's featured listing.
    pub async fn home_feed(&self) -> Result<AggregateResult<HomeFeed>> {
        let outcomes = self
            .fan_out("featured", "", |provider| {
                async move { provider.featured().await }.boxed()
            })
            .await;

        let (answered, failures) = self.partition("home_feed", outcomes)?;

        let mut hero = Vec::with_capacity(HERO_LIMIT);
        for (provider, slots) in HERO_SLOTS {
            if let Some((_, items)) = answered.iter().find(|(p, _)| *p == provider) {
                hero.extend(items.iter().take(slots).cloned());
            }
        }
        hero.truncate(HERO_LIMIT);

        let sections = answered
            .into_iter()
            .filter_map(|(provider, items)| {
                let title = self.provider(provider).ok()?.featured_title().to_string();
                Some(FeedSection {
                    provider,
                    title,
                    items,
                })
            })
            .collect();

        Ok(AggregateResult {
            items: HomeFeed { hero, sections },
            failures,
        })
    }

    pub async fn latest(&self, provider: Provider) -> Result<Vec<MediaItem>> {
        let fetch = self.provider(provider)?.latest();
        self.cached_list(provider, "latest", "", fetch).await
    }

    pub async fn trending(&self, provider: Provider) -> Result<Vec<MediaItem>> {
        let fetch = self.provider(provider)?.trending();
        self.cached_list(provider, "trending", "", fetch).await
    }

    pub async fn detail(&self, provider: Provider, id: &str) -> Result<MediaDetail> {
        let key = CacheKey::new(provider, "detail", id.trim());
        if let Some(detail) = self.details.get(&key) {
            self.report_cache_hit(provider, "detail");
            return Ok(detail);
        }

        let detail = self.provider(provider)?.detail(id).await?;
        self.details.insert(key, detail.clone());
        Ok(detail)
    }

    pub async fn episodes(&self, provider: Provider, id: &str) -> Result<Vec<Episode>> {
        self.provider(provider)?.episodes(id).await
    }

    /// Stream URLs are never cached; upstream links are short-lived.
    pub async fn stream_url(&self, provider: Provider, id: &str, episode_id: &str) -> Result<String> {
        self.provider(provider)?.stream_url(id, episode_id).await
    }

    /// Drops every cached answer.
    pub fn invalidate_cache(&self) {
        self.lists.clear();
        self.details.clear();
    }

    async fn cached_list<'a>(
        &'a self,
        provider: Provider,
        operation: &'static str,
        argument: &str,
        fetch: BoxFuture<'a, Result<Vec<MediaItem>>>,
    ) -> Result<Vec<MediaItem>> {
        let key = CacheKey::new(provider, operation, argument);
        if let Some(items) = self.lists.get(&key) {
            self.report_cache_hit(provider, operation);
            return Ok(items);
        }

        let items = fetch.await?;
        self.lists.insert(key, items.clone());
        Ok(items)
    }

    /// Runs `call` against every provider concurrently, answering from the
    /// list cache where possible. Outcomes come back in priority order.
    async fn fan_out<F>(
        &self,
        operation: &'static str,
        argument: &str,
        call: F,
    ) -> Vec<(Provider, Result<Vec<MediaItem>>)>
    where
        F: Fn(Arc<dyn CatalogProvider>) -> BoxFuture<'static, Result<Vec<MediaItem>>>,
    {
        let calls = self.providers.iter().map(|service| {
            let provider = service.provider();
            let fetch = call(service.clone());
            async move {
                let outcome = self.cached_list(provider, operation, argument, fetch).await;
                (provider, outcome)
            }
        });

        join_all(calls).await
    }

    /// Splits fan-out outcomes into answers and failures, reporting each
    /// failure. Fails when nobody answered.
    fn partition(
        &self,
        operation: &'static str,
        outcomes: Vec<(Provider, Result<Vec<MediaItem>>)>,
    ) -> Result<(Vec<(Provider, Vec<MediaItem>)>, Vec<ProviderFailure>)> {
        let mut answered = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for (provider, outcome) in outcomes {
            match outcome {
                Ok(items) => answered.push((provider, items)),
                Err(error) => {
                    warn!(%provider, operation, error = %error, "Catalog provider failed");
                    self.publish(CatalogEvent::ProviderFailed {
                        provider: provider.to_string(),
                        operation: operation.to_string(),
                        message: error.to_string(),
                    });
                    failures.push(ProviderFailure {
                        provider,
                        message: error.to_string(),
                    });
                }
            }
        }

        if answered.is_empty() && !failures.is_empty() {
            self.publish(CatalogEvent::AllProvidersFailed {
                operation: operation.to_string(),
                failed_providers: failures.iter().map(|f| f.provider.to_string()).collect(),
            });
            return Err(CatalogError::AllProvidersFailed {
                operation,
                failures,
            });
        }

        Ok((answered, failures))
    }

    fn report_cache_hit(&self, provider: Provider, operation: &'static str) {
        debug!(%provider, operation, "Served from query cache");
        self.publish(CatalogEvent::ServedFromCache {
            provider: provider.to_string(),
            operation: operation.to_string(),
        });
    }

    fn publish(&self, event: CatalogEvent) {
        if let Some(events) = &self.events {
            // No subscribers is not an error.
            let _ = events.emit(CoreEvent::Catalog(event));
        }
    }
}
