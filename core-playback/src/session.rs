//! # Playback Session
//!
//! Resilient state machine around one media source at a time.
//!
//! ```text
//! Init → DetectingProtocol → LoadingManifest → ReadyToPlay → Playing
//!                                  │                 │           │
//!                                  └──────► RecoverableError ◄───┘
//!                                                │
//!                                   Failed ◄─────┘        TimedOut (watchdog)
//! ```
//!
//! Every load gets a generation number. Teardown bumps it, so the watchdog
//! and the event sink of a replaced load can never touch the new one.
//!
//! The state lock is never held across a pipeline call. Transitions queue
//! commands for the pipeline, and whoever holds the driver role runs them
//! once the lock is released. An event emitted from inside a pipeline call
//! only queues more work for that same driver.

use crate::backend::{
    AttachOptions, FaultKind, MediaBackend, MediaPipeline, PipelineEvent, PipelineEventSink,
    StreamFault,
};
use crate::config::{PlaybackConfig, SessionState, SessionStats};
use crate::error::{PlaybackError, Result};
use crate::protocol::{detect_strategy, PlaybackStrategy};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::strip_query;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// A change of [`SessionState`], as broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub url: Option<String>,
    pub strategy: Option<PlaybackStrategy>,
    pub loading: bool,
    /// The current load has been playable at least once.
    pub reached_ready: bool,
    pub error: Option<PlaybackError>,
    pub stats: SessionStats,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    pipeline: Mutex<Option<Attached>>,
    config: PlaybackConfig,
}

impl Shared {
    pub(crate) fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Runs `f` on the attached pipeline if it belongs to `generation`.
    fn with_pipeline<T>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut dyn MediaPipeline) -> T,
    ) -> Option<T> {
        let mut slot = self.pipeline.lock();
        match slot.as_mut() {
            Some(attached) if attached.generation == generation => Some(f(attached.pipeline.as_mut())),
            _ => None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            session_id: inner.session_id.clone(),
            state: inner.state,
            url: inner.url.clone(),
            strategy: inner.strategy,
            loading: inner.loading,
            reached_ready: inner.reached_ready,
            error: inner.error.clone(),
            stats: inner.stats.clone(),
        }
    }
}

struct Attached {
    generation: u64,
    pipeline: Box<dyn MediaPipeline>,
}

/// Pipeline work decided under the state lock.
enum Command {
    Install {
        generation: u64,
        pipeline: Box<dyn MediaPipeline>,
    },
    /// Release whatever pipeline is attached.
    Detach,
    /// Release a pipeline that was never installed.
    Release(Box<dyn MediaPipeline>),
    StartLoad {
        generation: u64,
    },
    RecoverMediaError {
        generation: u64,
    },
    Autoplay {
        generation: u64,
    },
    Play {
        generation: u64,
        reply: mpsc::Sender<Result<()>>,
    },
}

impl Command {
    fn controls_current_load(&self) -> bool {
        matches!(
            self,
            Command::StartLoad { .. } | Command::RecoverMediaError { .. } | Command::Autoplay { .. }
        )
    }
}

struct Inner {
    session_id: String,
    generation: u64,
    state: SessionState,
    url: Option<String>,
    strategy: Option<PlaybackStrategy>,
    watchdog: Option<CancellationToken>,
    loading: bool,
    reached_ready: bool,
    /// `attach` is in progress; events are held until the pipeline is stored.
    attaching: bool,
    deferred: Vec<PipelineEvent>,
    commands: VecDeque<Command>,
    driving: bool,
    error: Option<PlaybackError>,
    /// State a recovery will return to.
    interrupted: Option<SessionState>,
    network_retries: u32,
    media_recovered: bool,
    stats: SessionStats,
    transitions: broadcast::Sender<StateTransition>,
    events: Option<EventBus>,
}

impl Inner {
    fn source(&self) -> String {
        self.url.clone().unwrap_or_default()
    }

    fn log_url(&self) -> &str {
        self.url.as_deref().map(strip_query).unwrap_or_default()
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;

        debug!(session_id = %self.session_id, %from, %to, "Playback state changed");
        let _ = self.transitions.send(StateTransition { from, to });
        self.publish(|session_id, url| PlaybackEvent::StateChanged {
            session_id,
            url,
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    fn publish(&self, build: impl FnOnce(String, String) -> PlaybackEvent) {
        if let Some(events) = &self.events {
            let event = build(self.session_id.clone(), self.log_url().to_string());
            let _ = events.emit(CoreEvent::Playback(event));
        }
    }

    fn cancel_watchdog(&mut self) {
        if let Some(token) = self.watchdog.take() {
            token.cancel();
        }
    }

    /// Stop everything belonging to the current load.
    fn teardown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.cancel_watchdog();
        self.attaching = false;
        self.deferred.clear();
        self.commands.retain(|command| !command.controls_current_load());
        self.commands.push_back(Command::Detach);
    }

    /// Store a freshly attached pipeline and start loading it.
    fn install(&mut self, generation: u64, pipeline: Box<dyn MediaPipeline>, config: &PlaybackConfig) {
        self.attaching = false;
        self.stats.attaches += 1;
        self.commands.push_back(Command::Install {
            generation,
            pipeline,
        });
        self.transition(SessionState::LoadingManifest);
        self.commands.push_back(Command::StartLoad { generation });

        for event in std::mem::take(&mut self.deferred) {
            if self.generation != generation {
                break;
            }
            self.handle(event, config);
        }
    }

    fn handle(&mut self, event: PipelineEvent, config: &PlaybackConfig) {
        match event {
            PipelineEvent::Fault(fault) => self.on_fault(fault, config),
            PipelineEvent::MediaElementError(details) => self.fail(details),
            PipelineEvent::PlaybackStarted => self.on_started(),
            PipelineEvent::ManifestParsed | PipelineEvent::MetadataLoaded | PipelineEvent::CanPlay => {
                self.on_ready_signal(config)
            }
        }
    }

    fn on_ready_signal(&mut self, config: &PlaybackConfig) {
        match self.state {
            SessionState::DetectingProtocol | SessionState::LoadingManifest => {
                self.become_ready(config.autoplay)
            }
            SessionState::RecoverableError => self.resume(config.autoplay),
            _ => {}
        }
    }

    fn on_started(&mut self) {
        match self.state {
            SessionState::DetectingProtocol | SessionState::LoadingManifest => {
                self.become_ready(false);
                self.transition(SessionState::Playing);
            }
            SessionState::RecoverableError => {
                self.cancel_watchdog();
                self.loading = false;
                self.interrupted = None;
                info!(url = %self.log_url(), "Playback recovered");
                self.transition(SessionState::Playing);
            }
            SessionState::ReadyToPlay => self.transition(SessionState::Playing),
            _ => {}
        }
    }

    fn become_ready(&mut self, autoplay: bool) {
        self.cancel_watchdog();
        self.loading = false;
        self.reached_ready = true;
        self.transition(SessionState::ReadyToPlay);
        info!(url = %self.log_url(), "Stream ready");

        if autoplay {
            self.try_autoplay();
        }
    }

    fn resume(&mut self, autoplay: bool) {
        info!(url = %self.log_url(), "Playback recovered");
        match self.interrupted.take() {
            Some(SessionState::Playing) => self.transition(SessionState::Playing),
            Some(SessionState::ReadyToPlay) => self.transition(SessionState::ReadyToPlay),
            _ => self.become_ready(autoplay),
        }
    }

    fn try_autoplay(&mut self) {
        self.commands.push_back(Command::Autoplay {
            generation: self.generation,
        });
    }

    fn on_fault(&mut self, fault: StreamFault, config: &PlaybackConfig) {
        if !fault.fatal {
            self.stats.non_fatal_faults += 1;
            debug!(kind = fault.kind.as_str(), details = %fault.details, "Non-fatal stream fault");
            return;
        }

        match fault.kind {
            FaultKind::Network => {
                if let Some(max) = config.max_network_retries {
                    if self.network_retries >= max {
                        return self.fail(format!(
                            "network error after {} retries: {}",
                            max, fault.details
                        ));
                    }
                }
                self.network_retries += 1;
                self.stats.network_recoveries += 1;
                let attempt = self.network_retries;
                self.enter_recovery(fault.kind, attempt, &fault.details);
                self.commands.push_back(Command::StartLoad {
                    generation: self.generation,
                });
            }
            FaultKind::MediaDecode if !self.media_recovered => {
                self.media_recovered = true;
                self.stats.media_recoveries += 1;
                self.enter_recovery(fault.kind, 1, &fault.details);
                self.commands.push_back(Command::RecoverMediaError {
                    generation: self.generation,
                });
            }
            FaultKind::MediaDecode => self.fail(format!(
                "media error persisted after recovery: {}",
                fault.details
            )),
            FaultKind::Other => self.fail(fault.details),
        }
    }

    fn enter_recovery(&mut self, kind: FaultKind, attempt: u32, details: &str) {
        if self.state != SessionState::RecoverableError {
            self.interrupted = Some(self.state);
        }
        warn!(
            url = %self.log_url(),
            fault = kind.as_str(),
            attempt,
            details,
            "Recovering from fatal stream fault"
        );
        self.transition(SessionState::RecoverableError);
        self.publish(|session_id, url| PlaybackEvent::Recovering {
            session_id,
            url,
            fault: kind.as_str().to_string(),
            attempt,
        });
    }

    fn fail(&mut self, details: String) {
        error!(url = %self.log_url(), details = %details, "Playback failed");
        self.settle(PlaybackError::StreamFailed {
            url: self.source(),
            details: details.clone(),
        });
        self.transition(SessionState::Failed);
        self.publish(|session_id, url| PlaybackEvent::Failed {
            session_id,
            url,
            message: details,
        });
    }

    fn time_out(&mut self, timeout: Duration) {
        warn!(url = %self.log_url(), timeout_ms = timeout.as_millis() as u64, "Stream never became playable");
        self.settle(PlaybackError::LoadTimeout {
            url: self.source(),
            timeout,
        });
        self.transition(SessionState::TimedOut);
        self.publish(|session_id, url| PlaybackEvent::TimedOut {
            session_id,
            url,
            timeout_ms: timeout.as_millis() as u64,
        });
    }

    /// Tear down and record the terminal error, before subscribers hear of it.
    fn settle(&mut self, error: PlaybackError) {
        self.teardown();
        self.loading = false;
        self.interrupted = None;
        self.error = Some(error);
    }
}

/// Entry point for [`PipelineEventSink::emit`].
pub(crate) fn dispatch(shared: &Shared, generation: u64, event: PipelineEvent) -> bool {
    {
        let mut inner = shared.inner.lock();
        if inner.generation != generation {
            debug!(?event, "Ignoring event from a replaced pipeline");
            return false;
        }
        if inner.attaching {
            inner.deferred.push(event);
            return true;
        }
        inner.handle(event, &shared.config);
    }
    drive(shared);
    true
}

/// Runs queued commands until the queue is empty.
///
/// At most one caller drives at a time. Callers arriving while another one
/// drives leave their commands to it.
fn drive(shared: &Shared) {
    {
        let mut inner = shared.inner.lock();
        if inner.driving {
            return;
        }
        inner.driving = true;
    }

    loop {
        let next = {
            let mut inner = shared.inner.lock();
            let next = inner.commands.pop_front();
            if next.is_none() {
                inner.driving = false;
            }
            next
        };
        match next {
            Some(command) => execute(shared, command),
            None => return,
        }
    }
}

fn execute(shared: &Shared, command: Command) {
    match command {
        Command::Install {
            generation,
            pipeline,
        } => {
            let previous = shared.pipeline.lock().replace(Attached {
                generation,
                pipeline,
            });
            if let Some(mut previous) = previous {
                previous.pipeline.release();
            }
        }
        Command::Detach => {
            let detached = shared.pipeline.lock().take();
            if let Some(mut attached) = detached {
                debug!(generation = attached.generation, "Releasing pipeline");
                attached.pipeline.release();
            }
        }
        Command::Release(mut pipeline) => pipeline.release(),
        Command::StartLoad { generation } => {
            shared.with_pipeline(generation, |pipeline| pipeline.start_load());
        }
        Command::RecoverMediaError { generation } => {
            shared.with_pipeline(generation, |pipeline| pipeline.recover_media_error());
        }
        Command::Autoplay { generation } => {
            if let Some(Err(e)) = shared.with_pipeline(generation, |pipeline| pipeline.play()) {
                let mut inner = shared.inner.lock();
                if inner.generation == generation {
                    inner.stats.autoplay_refusals += 1;
                }
                warn!(error = %e, "Autoplay refused; waiting for an explicit play");
            }
        }
        Command::Play { generation, reply } => {
            let result = shared
                .with_pipeline(generation, |pipeline| pipeline.play())
                .unwrap_or(Err(PlaybackError::NoSource));
            let _ = reply.send(result);
        }
    }
}

fn on_watchdog(shared: &Shared, generation: u64, token: &CancellationToken, timeout: Duration) {
    {
        let mut inner = shared.inner.lock();
        if token.is_cancelled() || inner.generation != generation {
            return;
        }
        if inner.state.is_ready() || inner.state.is_terminal() {
            return;
        }
        inner.time_out(timeout);
    }
    drive(shared);
}

fn spawn_watchdog(
    handle: &Handle,
    shared: Weak<Shared>,
    generation: u64,
    token: CancellationToken,
    timeout: Duration,
) {
    handle.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                if let Some(shared) = shared.upgrade() {
                    on_watchdog(&shared, generation, &token, timeout);
                }
            }
        }
    });
}

/// Plays one source at a time through a [`MediaBackend`].
///
/// # Example
///
/// ```ignore
/// let session = PlaybackSession::new(backend, PlaybackConfig::default())?;
/// let mut transitions = session.subscribe();
///
/// session.load("https://cdn.example.com/ep1/index.m3u8")?;
/// while let Ok(change) = transitions.recv().await {
///     if change.to.is_ready() || change.to.is_terminal() {
///         break;
///     }
/// }
/// ```
pub struct PlaybackSession {
    shared: Arc<Shared>,
    backend: Arc<dyn MediaBackend>,
}

impl PlaybackSession {
    pub fn new(backend: Arc<dyn MediaBackend>, config: PlaybackConfig) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let (transitions, _) = broadcast::channel(config.transition_buffer);
        let inner = Inner {
            session_id: Uuid::new_v4().to_string(),
            generation: 0,
            state: SessionState::Init,
            url: None,
            strategy: None,
            watchdog: None,
            loading: false,
            reached_ready: false,
            attaching: false,
            deferred: Vec::new(),
            commands: VecDeque::new(),
            driving: false,
            error: None,
            interrupted: None,
            network_retries: 0,
            media_recovered: false,
            stats: SessionStats::default(),
            transitions,
            events: None,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                pipeline: Mutex::new(None),
                config,
            }),
            backend,
        })
    }

    /// Mirror transitions and failures onto the core event bus.
    pub fn with_event_bus(self, events: EventBus) -> Self {
        self.shared.inner.lock().events = Some(events);
        self
    }

    /// Load `url`, replacing whatever was loaded before.
    ///
    /// Returns once the pipeline is attached and loading; readiness and
    /// failures arrive as state transitions. Must be called from within a
    /// tokio runtime, which drives the load watchdog.
    #[instrument(skip_all, fields(url = %strip_query(url)))]
    pub fn load(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PlaybackError::NoSource);
        }
        let handle = Handle::try_current().map_err(|_| PlaybackError::RuntimeUnavailable)?;
        let config = &self.shared.config;
        let capabilities = self.backend.capabilities();

        let (generation, strategy) = {
            let mut inner = self.shared.inner.lock();
            inner.teardown();
            inner.url = Some(url.to_string());
            inner.strategy = None;
            inner.error = None;
            inner.interrupted = None;
            inner.network_retries = 0;
            inner.media_recovered = false;
            inner.stats = SessionStats::default();
            inner.loading = true;
            inner.reached_ready = false;
            inner.transition(SessionState::Init);

            let generation = inner.generation;
            let token = CancellationToken::new();
            inner.watchdog = Some(token.clone());
            spawn_watchdog(
                &handle,
                Arc::downgrade(&self.shared),
                generation,
                token,
                config.watchdog_timeout,
            );

            inner.transition(SessionState::DetectingProtocol);
            let strategy = detect_strategy(url, &capabilities);
            inner.strategy = Some(strategy);
            inner.attaching = true;
            (generation, strategy)
        };
        info!(?strategy, "Loading stream");

        // The replaced pipeline goes before the new one is attached.
        drive(&self.shared);

        let options = AttachOptions {
            low_latency: config.low_latency,
            enable_worker: config.enable_worker,
        };
        let sink = PipelineEventSink::new(Arc::downgrade(&self.shared), generation);
        let attached = self.backend.attach(url, strategy, &options, sink);

        let result = {
            let mut inner = self.shared.inner.lock();
            let current = inner.generation == generation;
            match attached {
                Ok(pipeline) if current => {
                    inner.install(generation, pipeline, config);
                    Ok(())
                }
                Ok(pipeline) => {
                    debug!("Load was superseded while attaching");
                    inner.commands.push_back(Command::Release(pipeline));
                    Ok(())
                }
                Err(e) => {
                    let error = match e {
                        e @ PlaybackError::AttachFailed { .. } => e,
                        other => PlaybackError::AttachFailed {
                            url: url.to_string(),
                            details: other.to_string(),
                        },
                    };
                    error!(error = %error, "Could not attach pipeline");
                    if current {
                        inner.settle(error.clone());
                        inner.transition(SessionState::Failed);
                        let message = error.to_string();
                        inner.publish(|session_id, url| PlaybackEvent::Failed {
                            session_id,
                            url,
                            message,
                        });
                    }
                    Err(error)
                }
            }
        };

        drive(&self.shared);
        result
    }

    /// Ask the pipeline to start playback.
    pub fn play(&self) -> Result<()> {
        let (reply, response) = mpsc::channel();
        {
            let mut inner = self.shared.inner.lock();
            let generation = inner.generation;
            inner.commands.push_back(Command::Play { generation, reply });
        }
        drive(&self.shared);
        response.recv().unwrap_or(Err(PlaybackError::NoSource))
    }

    /// Tear down the current source and return to `Init`.
    pub fn close(&self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.teardown();
            inner.loading = false;
            inner.error = None;
            inner.interrupted = None;
            inner.transition(SessionState::Init);
            inner.url = None;
            inner.strategy = None;
        }
        drive(&self.shared);
    }

    pub fn session_id(&self) -> String {
        self.shared.inner.lock().session_id.clone()
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    /// `true` from `load` until the source is ready or the load ends.
    pub fn is_loading(&self) -> bool {
        self.shared.inner.lock().loading
    }

    /// The terminal error of the current load, if any.
    pub fn error(&self) -> Option<PlaybackError> {
        self.shared.inner.lock().error.clone()
    }

    pub fn url(&self) -> Option<String> {
        self.shared.inner.lock().url.clone()
    }

    pub fn strategy(&self) -> Option<PlaybackStrategy> {
        self.shared.inner.lock().strategy
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.inner.lock().stats.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    /// Subscribe to state transitions from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.shared.inner.lock().transitions.subscribe()
    }

    /// Transitions from now on, plus a way to look at the session directly
    /// when the feed falls behind.
    pub fn watch(&self) -> SessionWatcher {
        SessionWatcher {
            transitions: self.subscribe(),
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.shared.inner.lock().teardown();
        drive(&self.shared);
    }
}

/// Follows one session without keeping it alive.
pub struct SessionWatcher {
    transitions: broadcast::Receiver<StateTransition>,
    shared: Weak<Shared>,
}

impl SessionWatcher {
    /// Next transition. `RecvError::Lagged` means some were dropped; use
    /// [`SessionWatcher::snapshot`] to catch up.
    pub async fn recv(&mut self) -> std::result::Result<StateTransition, RecvError> {
        self.transitions.recv().await
    }

    /// Current view of the session, or `None` once it has been dropped.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.shared.upgrade().map(|shared| shared.snapshot())
    }
}

impl std::fmt::Debug for SessionWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWatcher")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("PlaybackSession")
            .field("session_id", &inner.session_id)
            .field("state", &inner.state)
            .field("url", &inner.log_url())
            .finish()
    }
}
