//! # Session Configuration
//!
//! Configuration, lifecycle state and statistics types for playback sessions.

use core_runtime::config::PlaybackSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Playback session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How long a load may take to become playable before it times out.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_watchdog_timeout")]
    pub watchdog_timeout: Duration,

    /// Start playback as soon as the session is ready.
    #[serde(default = "default_true")]
    pub autoplay: bool,

    /// Passed to segmented pipelines: prefer the live edge.
    #[serde(default = "default_true")]
    pub low_latency: bool,

    /// Passed to segmented pipelines: demux off the main thread.
    #[serde(default = "default_true")]
    pub enable_worker: bool,

    /// Cap on network-class reloads per load. `None` retries without limit.
    #[serde(default)]
    pub max_network_retries: Option<u32>,

    /// Capacity of the state-transition channel.
    ///
    /// Default: 64.
    #[serde(default = "default_transition_buffer")]
    pub transition_buffer: usize,
}

fn default_watchdog_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_transition_buffer() -> usize {
    64
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            watchdog_timeout: default_watchdog_timeout(),
            autoplay: true,
            low_latency: true,
            enable_worker: true,
            max_network_retries: None,
            transition_buffer: default_transition_buffer(),
        }
    }
}

impl From<&PlaybackSettings> for PlaybackConfig {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            watchdog_timeout: settings.watchdog_timeout,
            autoplay: settings.autoplay,
            low_latency: settings.low_latency,
            enable_worker: settings.enable_worker,
            max_network_retries: settings.max_network_retries,
            ..Self::default()
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.watchdog_timeout.is_zero() {
            return Err("watchdog_timeout must be > 0".to_string());
        }

        if self.transition_buffer == 0 {
            return Err("transition_buffer must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing loaded yet, or the session was closed.
    Init,
    /// Choosing a playback strategy for the source.
    DetectingProtocol,
    /// A pipeline is attached and loading the source.
    LoadingManifest,
    /// Playable; waiting for playback to start.
    ReadyToPlay,
    Playing,
    /// A fatal fault is being recovered from.
    RecoverableError,
    /// Terminal: the source could not be played.
    Failed,
    /// Terminal: the source never became playable in time.
    TimedOut,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Init => "init",
            SessionState::DetectingProtocol => "detecting_protocol",
            SessionState::LoadingManifest => "loading_manifest",
            SessionState::ReadyToPlay => "ready_to_play",
            SessionState::Playing => "playing",
            SessionState::RecoverableError => "recoverable_error",
            SessionState::Failed => "failed",
            SessionState::TimedOut => "timed_out",
        }
    }

    /// Returns `true` once the media is ready or playing.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::ReadyToPlay | Self::Playing)
    }

    /// Returns `true` if no further events can change the state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one session, reset on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Pipelines attached.
    pub attaches: u32,
    /// Network-class reloads issued.
    pub network_recoveries: u32,
    /// In-place media recoveries issued.
    pub media_recoveries: u32,
    /// Non-fatal faults observed.
    pub non_fatal_faults: u32,
    /// Autoplay attempts refused by the pipeline.
    pub autoplay_refusals: u32,
}
