//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using an SQLite-backed key-value table
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new(bridge_desktop::default_settings_path()).await?;
//!     // Hand both to CoreConfig
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

use std::path::PathBuf;

pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;

/// Default location of the settings database: the platform data directory,
/// falling back to the working directory when none is known.
pub fn default_settings_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("drama-stream")
        .join("settings.db")
}
