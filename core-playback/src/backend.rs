//! # Media Backend Contract
//!
//! The session never talks to a media element or a demuxer directly. A
//! [`MediaBackend`] attaches a [`MediaPipeline`] for a source, and the pipeline
//! reports what happens through the [`PipelineEventSink`] it was handed.
//!
//! ## Threading
//!
//! `PipelineEventSink::emit` runs the session's state machine on the calling
//! thread. Emitting from inside `start_load`, `recover_media_error`, `play`
//! or `release` is allowed; follow-up pipeline calls run after the current
//! one returns. Events emitted during `MediaBackend::attach` take effect once
//! the pipeline has been stored.

use crate::error::Result;
use crate::protocol::PlaybackStrategy;
use crate::session::{self, Shared};
use std::fmt;
use std::sync::Weak;

/// What the platform can play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// A software demuxer for segmented manifests is available.
    pub software_demux: bool,
    /// The platform plays segmented manifests natively.
    pub native_adaptive: bool,
}

/// Options applied when a pipeline is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOptions {
    pub low_latency: bool,
    pub enable_worker: bool,
}

/// Class of a streaming fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Manifest or segment transfer failed.
    Network,
    /// The media could not be decoded or appended.
    MediaDecode,
    Other,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Network => "network",
            FaultKind::MediaDecode => "media",
            FaultKind::Other => "other",
        }
    }
}

/// A fault reported by the streaming library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFault {
    pub kind: FaultKind,
    /// Non-fatal faults are handled by the library itself.
    pub fatal: bool,
    pub details: String,
}

impl StreamFault {
    pub fn fatal(kind: FaultKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            details: details.into(),
        }
    }

    pub fn non_fatal(kind: FaultKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            details: details.into(),
        }
    }
}

/// Signals a pipeline reports back to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The segmented manifest was parsed.
    ManifestParsed,
    /// Media metadata (duration, dimensions) is known.
    MetadataLoaded,
    /// Enough data is buffered to start.
    CanPlay,
    PlaybackStarted,
    /// The streaming library reported a fault.
    Fault(StreamFault),
    /// The media element itself errored. Always fatal.
    MediaElementError(String),
}

impl PipelineEvent {
    /// Whether this event means the media is (again) playable.
    pub fn is_ready_signal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::ManifestParsed
                | PipelineEvent::MetadataLoaded
                | PipelineEvent::CanPlay
                | PipelineEvent::PlaybackStarted
        )
    }
}

/// Platform media stack.
pub trait MediaBackend: Send + Sync {
    fn capabilities(&self) -> BackendCapabilities;

    /// Attach a pipeline for `url` using `strategy`.
    ///
    /// The returned pipeline has not started loading yet; the session calls
    /// [`MediaPipeline::start_load`] once it is stored.
    fn attach(
        &self,
        url: &str,
        strategy: PlaybackStrategy,
        options: &AttachOptions,
        events: PipelineEventSink,
    ) -> Result<Box<dyn MediaPipeline>>;
}

/// One attached source.
pub trait MediaPipeline: Send {
    /// Begin (or restart) loading the source.
    fn start_load(&mut self);

    /// Attempt in-place recovery from a media decode fault.
    fn recover_media_error(&mut self);

    /// Start playback. May be refused, e.g. by an autoplay policy.
    fn play(&mut self) -> Result<()>;

    /// Detach and free everything the pipeline holds.
    fn release(&mut self);
}

/// Route from a pipeline back to the session that attached it.
///
/// Each load hands out a sink bound to that load. Once the session moves on
/// (new load, close, drop) the sink goes stale and its events are ignored.
#[derive(Clone)]
pub struct PipelineEventSink {
    shared: Weak<Shared>,
    generation: u64,
}

impl PipelineEventSink {
    pub(crate) fn new(shared: Weak<Shared>, generation: u64) -> Self {
        Self { shared, generation }
    }

    /// Deliver an event. Returns `false` if the sink is stale.
    pub fn emit(&self, event: PipelineEvent) -> bool {
        match self.shared.upgrade() {
            Some(shared) => session::dispatch(&shared, self.generation, event),
            None => false,
        }
    }

    /// Whether the load this sink belongs to is still current.
    pub fn is_current(&self) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.generation() == self.generation)
            .unwrap_or(false)
    }
}

impl fmt::Debug for PipelineEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEventSink")
            .field("generation", &self.generation)
            .finish()
    }
}
