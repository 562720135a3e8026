//! # Watch History Module
//!
//! Keeps the bounded continue-watching log: at most one entry per title,
//! most recent first, persisted as a single JSON blob through the settings
//! bridge.

pub mod error;
pub mod models;
pub mod store;

pub use error::{HistoryError, Result};
pub use models::{HistoryEntry, RecordOutcome};
pub use store::{HistoryRepository, HistoryStore};
