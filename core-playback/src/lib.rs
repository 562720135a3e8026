//! # Playback Module
//!
//! Resilient playback sessions over a host-provided media stack.
//!
//! ## Overview
//!
//! - Strategy detection for segmented manifests vs. progressive files ([`protocol`])
//! - The backend/pipeline contract the host implements ([`backend`])
//! - The session state machine with load watchdog and fault recovery ([`session`])
//!
//! The crate never decodes media itself.

pub mod backend;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;

pub use backend::{
    AttachOptions, BackendCapabilities, FaultKind, MediaBackend, MediaPipeline, PipelineEvent,
    PipelineEventSink, StreamFault,
};
pub use config::{PlaybackConfig, SessionState, SessionStats};
pub use error::{PlaybackError, Result};
pub use protocol::{detect_strategy, is_manifest_url, PlaybackStrategy};
pub use session::{PlaybackSession, SessionSnapshot, SessionWatcher, StateTransition};
