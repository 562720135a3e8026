//! Integration tests for the service façade
//!
//! Wires a full `CoreService` over a mocked HTTP bridge, an in-memory
//! settings store and a scripted media backend, and checks the watch flow:
//! stream resolution and recording history once playback starts.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::SettingsStore;
use core_catalog::{Episode, Provider};
use core_history::{HistoryRepository, RecordOutcome};
use core_playback::{
    AttachOptions, BackendCapabilities, FaultKind, MediaBackend, MediaPipeline, PipelineEvent,
    PipelineEventSink, PlaybackConfig, PlaybackSession, PlaybackStrategy, StreamFault,
};
use core_runtime::config::CoreConfig;
use core_service::{CoreService, WatchRequest};
use mockall::mock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
struct MemorySettings(Mutex<HashMap<String, String>>);

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.0.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.0.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.0.lock().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.0.lock().clear();
        Ok(())
    }
}

/// Backend whose pipelines do nothing; tests drive them through the sinks.
#[derive(Default)]
struct SilentBackend {
    sinks: Mutex<Vec<PipelineEventSink>>,
}

impl SilentBackend {
    fn emit(&self, event: PipelineEvent) -> bool {
        self.sinks.lock().last().map(|sink| sink.emit(event)).unwrap_or(false)
    }
}

struct SilentPipeline;

impl MediaPipeline for SilentPipeline {
    fn start_load(&mut self) {}
    fn recover_media_error(&mut self) {}
    fn play(&mut self) -> core_playback::Result<()> {
        Ok(())
    }
    fn release(&mut self) {}
}

impl MediaBackend for SilentBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            software_demux: true,
            native_adaptive: false,
        }
    }

    fn attach(
        &self,
        _url: &str,
        _strategy: PlaybackStrategy,
        _options: &AttachOptions,
        events: PipelineEventSink,
    ) -> core_playback::Result<Box<dyn MediaPipeline>> {
        self.sinks.lock().push(events);
        Ok(Box::new(SilentPipeline))
    }
}

fn routed_http(routes: Vec<(&'static str, u16, &'static str)>) -> MockHttp {
    let mut http = MockHttp::new();
    http.expect_execute().returning(move |request| {
        for (path, status, body) in &routes {
            if request.url.contains(path) {
                return Ok(HttpResponse::new(*status, *body));
            }
        }
        Ok(HttpResponse::new(404, "not found"))
    });
    http
}

fn service_over(http: MockHttp) -> CoreService {
    let config = CoreConfig::builder()
        .api_base_url("https://api.example.com/api")
        .http_client(Arc::new(http))
        .settings_store(Arc::new(MemorySettings::default()))
        .build()
        .unwrap();
    CoreService::new(config).unwrap()
}

const MELOLO_DETAIL: &str = r#"{
    "id": "m1",
    "title": "Love Again",
    "cover": "https://img.example.com/m1.jpg",
    "episodes": [
        {"vid": "v1", "vid_index": 1, "title": "Pilot"},
        {"vid": "v2", "vid_index": 2}
    ]
}"#;

#[tokio::test]
async fn test_service_wires_all_providers() {
    let service = service_over(MockHttp::new());

    let providers: Vec<Provider> = service.catalog().providers().collect();
    assert_eq!(
        providers,
        vec![
            Provider::DramaBox,
            Provider::NetShort,
            Provider::Melolo,
            Provider::Anime
        ]
    );
    assert_eq!(service.history().capacity(), 20);
}

#[tokio::test]
async fn test_resolve_stream_prefers_inline_url() {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    let service = service_over(http);

    let episode = Episode {
        id: "3".to_string(),
        title: "Episode 3".to_string(),
        number: Some(3),
        url: Some("https://cdn.example.com/db/3.m3u8".to_string()),
        cover: None,
        duration: None,
    };

    let url = service
        .watch()
        .resolve_stream(Provider::DramaBox, "41", "3", Some(&episode))
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/db/3.m3u8");
}

#[tokio::test]
async fn test_resolve_stream_falls_back_to_provider() {
    let service = service_over(routed_http(vec![(
        "/melolo/stream",
        200,
        r#"{"data":{"url":"https://cdn.example.com/m1/v2.mp4"}}"#,
    )]));

    let url = service
        .watch()
        .resolve_stream(Provider::Melolo, "m1", "v2", None)
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/m1/v2.mp4");
}

#[tokio::test]
async fn test_history_recorded_once_playback_is_ready() {
    let service = service_over(routed_http(vec![("/melolo/detail", 200, MELOLO_DETAIL)]));
    let backend = Arc::new(SilentBackend::default());
    let session = service.new_playback_session(backend.clone()).unwrap();

    let watcher = service.watch().clone();
    let transitions = session.watch();
    let recording = tokio::spawn(async move {
        watcher
            .record_on_start(transitions, WatchRequest::new(Provider::Melolo, "m1", "v1"))
            .await
    });

    session.load("https://cdn.example.com/m1/v1.m3u8").unwrap();
    assert!(service.history().list().await.unwrap().is_empty());
    assert!(backend.emit(PipelineEvent::ManifestParsed));

    let outcome = recording.await.unwrap().unwrap();
    assert_eq!(outcome, Some(RecordOutcome::Recorded));

    let entries = service.history().list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item.id, "m1");
    assert_eq!(entries[0].item.title, "Love Again");
    assert_eq!(entries[0].last_episode_label, "Pilot");
    assert_eq!(entries[0].last_episode_id, "v1");
}

#[tokio::test]
async fn test_untitled_episode_gets_numbered_label() {
    let service = service_over(routed_http(vec![("/melolo/detail", 200, MELOLO_DETAIL)]));

    service
        .watch()
        .record_started(&WatchRequest::new(Provider::Melolo, "m1", "9"))
        .await
        .unwrap();

    let entries = service.history().list().await.unwrap();
    assert_eq!(entries[0].last_episode_label, "Episode 9");
}

#[tokio::test]
async fn test_detail_failure_records_placeholder() {
    let service = service_over(routed_http(vec![("/dramabox/detail", 500, "boom")]));

    let outcome = service
        .watch()
        .record_started(&WatchRequest::new(Provider::DramaBox, "41", "3"))
        .await
        .unwrap();

    assert_eq!(outcome, RecordOutcome::Recorded);
    let entries = service.history().list().await.unwrap();
    assert_eq!(entries[0].item.title, "Untitled");
    assert_eq!(entries[0].item.provider, Provider::DramaBox);
    assert_eq!(entries[0].last_episode_label, "Episode 3");
}

#[tokio::test]
async fn test_failed_playback_records_nothing() {
    let service = service_over(routed_http(vec![("/melolo/detail", 200, MELOLO_DETAIL)]));
    let backend = Arc::new(SilentBackend::default());
    let session = service.new_playback_session(backend.clone()).unwrap();

    let watcher = service.watch().clone();
    let transitions = session.watch();
    let recording = tokio::spawn(async move {
        watcher
            .record_on_start(transitions, WatchRequest::new(Provider::Melolo, "m1", "v1"))
            .await
    });

    session.load("https://cdn.example.com/m1/v1.m3u8").unwrap();
    backend.emit(PipelineEvent::MediaElementError("unsupported source".into()));

    assert_eq!(recording.await.unwrap().unwrap(), None);
    assert!(service.history().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_session_records_nothing() {
    let service = service_over(MockHttp::new());
    let backend = Arc::new(SilentBackend::default());
    let session = service.new_playback_session(backend).unwrap();

    let watcher = service.watch().clone();
    let transitions = session.watch();
    let recording = tokio::spawn(async move {
        watcher
            .record_on_start(transitions, WatchRequest::new(Provider::Anime, "naruto", "1"))
            .await
    });

    session.load("https://cdn.example.com/a/1.mp4").unwrap();
    session.close();

    assert_eq!(recording.await.unwrap().unwrap(), None);
}

#[tokio::test]
async fn test_ready_state_missed_by_lagging_feed_still_records() {
    let service = service_over(routed_http(vec![("/melolo/detail", 200, MELOLO_DETAIL)]));
    let backend = Arc::new(SilentBackend::default());
    let session = PlaybackSession::new(
        backend.clone(),
        PlaybackConfig {
            transition_buffer: 1,
            ..PlaybackConfig::default()
        },
    )
    .unwrap();
    let transitions = session.watch();

    session.load("https://cdn.example.com/m1/v1.m3u8").unwrap();
    assert!(backend.emit(PipelineEvent::ManifestParsed));
    assert!(backend.emit(PipelineEvent::Fault(StreamFault::fatal(
        FaultKind::Network,
        "segment load error",
    ))));

    let outcome = service
        .watch()
        .record_on_start(transitions, WatchRequest::new(Provider::Melolo, "m1", "v1"))
        .await
        .unwrap();

    assert_eq!(outcome, Some(RecordOutcome::Recorded));
    assert_eq!(service.history().list().await.unwrap()[0].last_episode_label, "Pilot");
}
