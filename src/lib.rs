//! Workspace umbrella crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates.
//! Host applications can depend on `drama-stream-workspace` and enable
//! `desktop-shims` to get the service façade with the reqwest and SQLite
//! bridges wired in.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, CoreService, WatchRequest, WatchService};
