//! # Playback Error Types

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a playback session.
///
/// Cloneable so the terminal error can be kept on the session and handed to
/// every caller that asks for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    // ========================================================================
    // Terminal session outcomes
    // ========================================================================
    /// The stream failed and could not be recovered.
    #[error("Playback failed for {url}: {details}")]
    StreamFailed { url: String, details: String },

    /// The stream never became playable within the watchdog window.
    #[error("Timed out after {}s waiting for {url} to become playable", .timeout.as_secs())]
    LoadTimeout { url: String, timeout: Duration },

    /// The backend could not attach a pipeline for the source.
    #[error("Could not attach a pipeline for {url}: {details}")]
    AttachFailed { url: String, details: String },

    // ========================================================================
    // Control errors
    // ========================================================================
    /// A playback start was refused, typically by an autoplay policy.
    #[error("Playback start refused: {0}")]
    PlayRejected(String),

    /// `load` was called outside a tokio runtime.
    #[error("No async runtime available to drive the session")]
    RuntimeUnavailable,

    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// The operation needs a loaded source.
    #[error("No source loaded")]
    NoSource,
}

impl PlaybackError {
    /// Whether this is the dead-link timeout rather than a confirmed failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PlaybackError::LoadTimeout { .. })
    }

    /// Source URL the error is about, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            PlaybackError::StreamFailed { url, .. }
            | PlaybackError::LoadTimeout { url, .. }
            | PlaybackError::AttachFailed { url, .. } => Some(url),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
