//! Integration tests for the catalog aggregator
//!
//! These tests drive the real provider clients over a mocked HTTP bridge and
//! verify:
//! - Partial-failure tolerance and the all-failed error
//! - Priority ordering of concatenated results
//! - Home feed hero composition
//! - Query caching and the blank-query short circuit
//! - Detail and stream resolution edge cases

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::SystemClock;
use core_catalog::providers::CatalogProvider;
use core_catalog::{
    AnimeClient, ApiClient, CacheSettings, CatalogAggregator, CatalogError, DramaBoxClient,
    MeloloClient, NetShortClient, Provider,
};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.example.com/api";

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

type Route = (&'static str, BridgeResult<(u16, &'static str)>);

/// A mock that answers each request with the first route whose path is
/// contained in the request URL, and 404 otherwise.
fn routed_http(routes: Vec<Route>) -> MockHttp {
    let mut http = MockHttp::new();
    http.expect_execute().returning(move |request| {
        for (path, outcome) in &routes {
            if request.url.contains(path) {
                return match outcome {
                    Ok((status, body)) => Ok(HttpResponse::new(*status, *body)),
                    Err(_) => Err(BridgeError::OperationFailed("connection reset".to_string())),
                };
            }
        }
        Ok(HttpResponse::new(404, "not found"))
    });
    http
}

fn aggregator_over(http: MockHttp) -> CatalogAggregator {
    let api = ApiClient::new(Arc::new(http), BASE_URL, Duration::from_secs(15));
    let providers: Vec<Arc<dyn CatalogProvider>> = vec![
        // Deliberately out of priority order.
        Arc::new(AnimeClient::new(api.clone(), "https://otakudesu.cloud")),
        Arc::new(MeloloClient::new(api.clone())),
        Arc::new(DramaBoxClient::new(api.clone())),
        Arc::new(NetShortClient::new(api)),
    ];
    CatalogAggregator::new(providers, CacheSettings::default(), Arc::new(SystemClock))
}

#[tokio::test]
async fn test_search_survives_three_of_four_failures() {
    let http = routed_http(vec![
        ("/dramabox/search", Ok((500, "boom"))),
        ("/netshort/search", Err(BridgeError::OperationFailed(String::new()))),
        ("/melolo/search", Ok((200, r#"{"message":"maintenance"}"#))),
        (
            "/anime/search",
            Ok((200, r#"[{"url":"https://otakudesu.cloud/anime/naruto-sub-indo/","title":"Naruto"}]"#)),
        ),
    ]);
    let aggregator = aggregator_over(http);

    let result = aggregator.search("naruto").await.unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, "naruto-sub-indo");
    assert!(result.is_partial());
    let failed: Vec<Provider> = result.failures.iter().map(|f| f.provider).collect();
    assert_eq!(failed, vec![Provider::DramaBox, Provider::NetShort, Provider::Melolo]);
}

#[tokio::test]
async fn test_search_fails_only_when_every_provider_fails() {
    let http = routed_http(vec![("/search", Ok((502, "bad gateway")))]);
    let aggregator = aggregator_over(http);

    let err = aggregator.search("cinta").await.unwrap_err();

    match err {
        CatalogError::AllProvidersFailed { operation, failures } => {
            assert_eq!(operation, "search");
            assert_eq!(failures.len(), 4);
        }
        other => panic!("expected AllProvidersFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_concatenates_in_priority_order() {
    let http = routed_http(vec![
        ("/dramabox/search", Ok((200, r#"[{"bookId":"1","bookName":"A"},{"bookId":"2"}]"#))),
        ("/netshort/search", Ok((200, r#"{"data":[{"drama_id":3}]}"#))),
        ("/melolo/search", Ok((200, r#"{"data":{"list":[{"book_id":"4"}]}}"#))),
        ("/anime/search", Ok((200, r#"[{"slug":"five"}]"#))),
    ]);
    let aggregator = aggregator_over(http);

    let result = aggregator.search("  a  ").await.unwrap();

    let keys: Vec<(Provider, &str)> = result
        .items
        .iter()
        .map(|item| (item.provider, item.id.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Provider::DramaBox, "1"),
            (Provider::DramaBox, "2"),
            (Provider::NetShort, "3"),
            (Provider::Melolo, "4"),
            (Provider::Anime, "five"),
        ]
    );
    assert!(result.failures.is_empty());
    assert_eq!(result.items[1].title, "Untitled");
}

#[tokio::test]
async fn test_blank_query_does_not_fetch() {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    let aggregator = aggregator_over(http);

    let result = aggregator.search("   ").await.unwrap();

    assert!(result.items.is_empty());
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_provider_failure_is_published() {
    let http = routed_http(vec![
        ("/dramabox/search", Ok((200, "[]"))),
        ("/netshort/search", Ok((200, "[]"))),
        ("/melolo/search", Ok((200, "[]"))),
        ("/anime/search", Ok((500, "oops"))),
    ]);
    let events = EventBus::new(16);
    let mut receiver = events.subscribe();
    let aggregator = aggregator_over(http).with_event_bus(events);

    aggregator.search("x").await.unwrap();

    match receiver.try_recv().unwrap() {
        CoreEvent::Catalog(CatalogEvent::ProviderFailed {
            provider,
            operation,
            ..
        }) => {
            assert_eq!(provider, "anime");
            assert_eq!(operation, "search");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_home_feed_hero_composition() {
    let http = routed_http(vec![
        ("/dramabox/latest", Ok((200, r#"[{"id":"d1"},{"id":"d2"},{"id":"d3"}]"#))),
        ("/netshort/foryou", Ok((200, r#"[{"drama_id":"n1"},{"drama_id":"n2"}]"#))),
        ("/melolo/trending", Ok((200, r#"[{"id":"m1"},{"id":"m2"}]"#))),
        ("/anime/latest", Ok((200, r#"[{"slug":"a1"},{"slug":"a2"}]"#))),
    ]);
    let aggregator = aggregator_over(http);

    let feed = aggregator.home_feed().await.unwrap().items;

    let hero: Vec<&str> = feed.hero.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(hero, vec!["d1", "d2", "n1", "m1", "a1"]);

    let titles: Vec<&str> = feed.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["DramaBox Latest", "NetShort For You", "Popular on Melolo", "Anime Updates"]
    );
    assert_eq!(feed.sections[0].items.len(), 3);
}

#[tokio::test]
async fn test_home_feed_skips_failed_sections() {
    let http = routed_http(vec![
        ("/dramabox/latest", Ok((500, ""))),
        ("/netshort/foryou", Ok((200, r#"[{"drama_id":"n1"},{"drama_id":"n2"}]"#))),
        ("/melolo/trending", Ok((500, ""))),
        ("/anime/latest", Ok((500, ""))),
    ]);
    let aggregator = aggregator_over(http);

    let result = aggregator.home_feed().await.unwrap();

    assert_eq!(result.items.hero.len(), 1);
    assert_eq!(result.items.sections.len(), 1);
    assert_eq!(result.items.sections[0].provider, Provider::NetShort);
    assert_eq!(result.failures.len(), 3);
}

#[tokio::test]
async fn test_list_answers_are_cached() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, r#"[{"id":"7"}]"#)));
    let aggregator = aggregator_over(http);

    let first = aggregator.latest(Provider::Melolo).await.unwrap();
    let second = aggregator.latest(Provider::Melolo).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(2)
        .returning(|_| Ok(HttpResponse::new(503, "")));
    let aggregator = aggregator_over(http);

    assert!(aggregator.trending(Provider::DramaBox).await.is_err());
    assert!(aggregator.trending(Provider::DramaBox).await.is_err());
}

#[tokio::test]
async fn test_dramabox_detail_falls_back_to_episode_list() {
    let http = routed_http(vec![
        (
            "/dramabox/detail",
            Ok((200, r#"{"data":{"bookId":"41","bookName":"Sang Pewaris","episodes":[]}}"#)),
        ),
        (
            "/dramabox/allepisode",
            Ok((200, r#"[{"chapterId":"c1","videoUrl":"https://cdn.example.com/1.m3u8"}]"#)),
        ),
    ]);
    let aggregator = aggregator_over(http);

    let detail = aggregator.detail(Provider::DramaBox, "41").await.unwrap();

    assert_eq!(detail.item.title, "Sang Pewaris");
    assert_eq!(detail.episodes.len(), 1);
    assert_eq!(detail.episodes[0].url.as_deref(), Some("https://cdn.example.com/1.m3u8"));
}

#[tokio::test]
async fn test_dramabox_detail_uses_inline_episodes() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .withf(|request| request.url.contains("/dramabox/detail?id=41"))
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"bookId":"41","episodes":[{"id":"e1"},{"id":"e2"}]}"#,
            ))
        });
    let aggregator = aggregator_over(http);

    let detail = aggregator.detail(Provider::DramaBox, "41").await.unwrap();

    assert_eq!(detail.episodes.len(), 2);
}

#[tokio::test]
async fn test_dramabox_empty_primary_alias_keeps_inline_chapters() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .withf(|request| request.url.contains("/dramabox/detail?id=41"))
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"bookId":"41","episodes":[],"chapterList":[{"chapterId":"c1","videoUrl":"https://cdn.example.com/1.m3u8"}]}"#,
            ))
        });
    let aggregator = aggregator_over(http);

    let detail = aggregator.detail(Provider::DramaBox, "41").await.unwrap();

    assert_eq!(detail.episodes.len(), 1);
    assert_eq!(detail.episodes[0].url.as_deref(), Some("https://cdn.example.com/1.m3u8"));
}

#[tokio::test]
async fn test_netshort_missing_episode_is_an_error() {
    let http = routed_http(vec![(
        "/netshort/allepisode?drama_id=1882",
        Ok((200, r#"[{"episode":1,"url":"https://cdn.example.com/1.mp4"}]"#)),
    )]);
    let aggregator = aggregator_over(http);

    let url = aggregator
        .stream_url(Provider::NetShort, "1882", "1")
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/1.mp4");

    let err = aggregator
        .stream_url(Provider::NetShort, "1882", "5")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::EpisodeNotFound { provider: Provider::NetShort, .. }));
}

#[tokio::test]
async fn test_anime_detail_expands_slug() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| {
            request.url
                == "https://api.example.com/api/anime/detail?url=https%3A%2F%2Fotakudesu.cloud%2Fanime%2Fone-piece-sub-indo%2F"
        })
        .returning(|_| Ok(HttpResponse::new(200, r#"{"title":"One Piece"}"#)));
    let aggregator = aggregator_over(http);

    let detail = aggregator
        .detail(Provider::Anime, "one-piece-sub-indo")
        .await
        .unwrap();

    assert_eq!(detail.item.id, "one-piece-sub-indo");
    assert_eq!(detail.item.title, "One Piece");
}

const ONE_PIECE_DETAIL: &str = r#"{
    "data": {
        "title": "One Piece",
        "episode_list": [
            {"title": "Episode 1099", "episode": 1099, "url": "https://otakudesu.cloud/episode/op-1099/"},
            {"title": "Episode 1100", "episode": 1100, "url": "https://otakudesu.cloud/episode/op-1100/"}
        ]
    }
}"#;

#[tokio::test]
async fn test_anime_stream_resolves_episode_number_through_detail() {
    let http = routed_http(vec![
        ("/anime/detail", Ok((200, ONE_PIECE_DETAIL))),
        (
            "/anime/getvideo?url=https%3A%2F%2Fotakudesu.cloud%2Fepisode%2Fop-1100%2F",
            Ok((200, r#"{"data":{"url":"https://cdn.example.com/op-1100.mp4"}}"#)),
        ),
    ]);
    let aggregator = aggregator_over(http);

    let url = aggregator
        .stream_url(Provider::Anime, "one-piece-sub-indo", "1100")
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/op-1100.mp4");

    let err = aggregator
        .stream_url(Provider::Anime, "one-piece-sub-indo", "9999")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::EpisodeNotFound { provider: Provider::Anime, .. }));
}

#[tokio::test]
async fn test_anime_stream_without_video_is_unavailable() {
    let http = routed_http(vec![
        ("/anime/detail", Ok((200, ONE_PIECE_DETAIL))),
        ("/anime/getvideo", Ok((200, r#"{"data":{}}"#))),
    ]);
    let aggregator = aggregator_over(http);

    let err = aggregator
        .stream_url(Provider::Anime, "one-piece-sub-indo", "1099")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::StreamUnavailable { provider: Provider::Anime, .. }));
}

#[tokio::test]
async fn test_melolo_stream_without_url_is_unavailable() {
    let http = routed_http(vec![(
        "/melolo/stream?id=m1&episode=v2",
        Ok((200, r#"{"data":{"url":"  "}}"#)),
    )]);
    let aggregator = aggregator_over(http);

    let err = aggregator
        .stream_url(Provider::Melolo, "m1", "v2")
        .await
        .unwrap_err();
    match err {
        CatalogError::StreamUnavailable {
            provider,
            media_id,
            episode_id,
        } => {
            assert_eq!(provider, Provider::Melolo);
            assert_eq!(media_id, "m1");
            assert_eq!(episode_id, "v2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
