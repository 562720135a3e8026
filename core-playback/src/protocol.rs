//! Playback strategy detection.

use crate::backend::BackendCapabilities;
use serde::{Deserialize, Serialize};

/// How a source is fed to the media backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    /// Segmented manifest demuxed in software.
    SegmentedDemux,
    /// Segmented manifest handed to the platform's own adaptive player.
    NativeAdaptive,
    /// A single file played directly.
    Progressive,
}

/// Whether `url` points at a segmented-stream manifest.
///
/// Only the path counts; query string and fragment are ignored, and so is case.
pub fn is_manifest_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".m3u8")
}

/// Picks the strategy for `url` given what the backend supports.
pub fn detect_strategy(url: &str, capabilities: &BackendCapabilities) -> PlaybackStrategy {
    if !is_manifest_url(url) {
        return PlaybackStrategy::Progressive;
    }

    if capabilities.software_demux {
        PlaybackStrategy::SegmentedDemux
    } else if capabilities.native_adaptive {
        PlaybackStrategy::NativeAdaptive
    } else {
        PlaybackStrategy::Progressive
    }
}
