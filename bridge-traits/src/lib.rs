//! # Host Bridge Traits
//!
//! Capabilities the streaming core needs from its host, expressed as traits so
//! every platform can plug in its own implementation.
//!
//! - [`HttpClient`](http::HttpClient) - requests to the upstream catalog API
//! - [`SettingsStore`](storage::SettingsStore) - small persisted key-value state
//! - [`Clock`](time::Clock) - time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - forward structured logs to host logging
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! All bridge traits use [`BridgeError`](error::BridgeError) and require
//! `Send + Sync` so implementations can be shared across async tasks behind an
//! `Arc`.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::SettingsStore;
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
