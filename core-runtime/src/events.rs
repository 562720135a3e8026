//! # Event Bus System
//!
//! Typed, broadcast-based notifications between the core modules and the host,
//! built on `tokio::sync::broadcast`.
//!
//! ```text
//! ┌──────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ Catalog      ├────────>│           ├────────────>│ Subscriber │
//! └──────────────┘         │ EventBus  │             └────────────┘
//! ┌──────────────┐  emit   │ (broadcast│
//! │ Playback     ├────────>│  channel) │  subscribe  ┌────────────┐
//! └──────────────┘         │           ├────────────>│ Subscriber │
//! ┌──────────────┐  emit   │           │             └────────────┘
//! │ History      ├────────>│           │
//! └──────────────┘         └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, HistoryEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::History(HistoryEvent::Cleared)).ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Watch history cleared");
//! # }
//! ```
//!
//! Subscribers that fall behind by more than the buffer receive
//! `RecvError::Lagged(n)` and may continue; `RecvError::Closed` means every
//! sender is gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Catalog(CatalogEvent),
    Playback(PlaybackEvent),
    History(HistoryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::History(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Catalog(CatalogEvent::AllProvidersFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::TimedOut { .. }) => EventSeverity::Error,
            CoreEvent::Catalog(CatalogEvent::ProviderFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Recovering { .. }) => EventSeverity::Warning,
            CoreEvent::History(HistoryEvent::Reset { .. }) => EventSeverity::Warning,
            CoreEvent::History(HistoryEvent::Recorded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Events raised while querying the upstream catalog providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// One provider failed during a fan-out query; the others carried on.
    ProviderFailed {
        /// Provider tag (e.g. "netshort").
        provider: String,
        /// Operation that failed (e.g. "search").
        operation: String,
        message: String,
    },
    /// Every provider failed for the same fan-out query.
    AllProvidersFailed {
        operation: String,
        failed_providers: Vec<String>,
    },
    /// A list query was answered from the query cache.
    ServedFromCache { provider: String, operation: String },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::ProviderFailed { .. } => "Catalog provider failed",
            CatalogEvent::AllProvidersFailed { .. } => "All catalog providers failed",
            CatalogEvent::ServedFromCache { .. } => "Catalog query served from cache",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events mirrored from playback sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The session moved between lifecycle states.
    StateChanged {
        session_id: String,
        /// Source URL with the query string removed.
        url: String,
        from: String,
        to: String,
    },
    /// A fatal fault is being recovered from in place.
    Recovering {
        session_id: String,
        url: String,
        /// Fault class ("network" or "media").
        fault: String,
        attempt: u32,
    },
    /// The session failed for good.
    Failed {
        session_id: String,
        url: String,
        message: String,
    },
    /// The session never became playable within the watchdog window.
    TimedOut {
        session_id: String,
        url: String,
        timeout_ms: u64,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::Recovering { .. } => "Recovering playback",
            PlaybackEvent::Failed { .. } => "Playback failed",
            PlaybackEvent::TimedOut { .. } => "Playback timed out",
        }
    }
}

// ============================================================================
// History Events
// ============================================================================

/// Events raised by the watch-history store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum HistoryEvent {
    Recorded {
        provider: String,
        media_id: String,
        episode_id: String,
    },
    Removed { provider: String, media_id: String },
    /// A stored log could not be read and was replaced by an empty one.
    Reset { reason: String },
    Cleared,
}

impl HistoryEvent {
    fn description(&self) -> &str {
        match self {
            HistoryEvent::Recorded { .. } => "Watch progress recorded",
            HistoryEvent::Removed { .. } => "Title removed from watch history",
            HistoryEvent::Reset { .. } => "Watch history reset",
            HistoryEvent::Cleared => "Watch history cleared",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every [`subscribe`](Self::subscribe)
/// creates an independent receiver that sees events emitted after it was
/// created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(100);
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
