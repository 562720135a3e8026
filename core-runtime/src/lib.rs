//! # Core Runtime Module
//!
//! Foundational infrastructure shared by every core crate:
//! - Logging and tracing setup ([`logging`])
//! - Configuration and bridge injection ([`config`])
//! - The broadcast event bus ([`events`])

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, HistorySettings, PlaybackSettings};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
