//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_query, LogFormat, LoggingConfig,
};
use std::env;
use tracing::{debug, info, instrument, span, warn, Level};

#[tokio::main]
async fn main() -> core_runtime::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }
    init_logging(config)?;

    info!(format = ?format, "Logging initialized");

    search_all("ceo").await;
    load_stream("https://cdn.example.com/ep1/index.m3u8?token=abc123");

    info!(
        api_key = %redact_if_sensitive("api_key", "k-live-123"),
        "Secrets never reach the log"
    );

    Ok(())
}

#[instrument]
async fn search_all(query: &str) {
    for provider in ["dramabox", "netshort", "melolo", "anime"] {
        let span = span!(Level::DEBUG, "provider_search", provider);
        let _enter = span.enter();
        debug!("Querying provider");
    }

    warn!(provider = "netshort", "Provider failed; continuing with the rest");
    info!(results = 12, failures = 1, "Search complete");
}

fn load_stream(url: &str) {
    info!(url = %strip_query(url), "Loading stream");
}
