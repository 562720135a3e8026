//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_query, LogFormat, LoggingConfig};

#[test]
fn test_logging_configuration() {
    // A global subscriber can only be installed once per process, so only the
    // builder is exercised here.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
}

#[test]
fn test_redaction_of_secrets() {
    assert_eq!(redact_if_sensitive("api_key", "k-123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("url_signature", "deadbeef"), "[REDACTED]");
}

#[test]
fn test_normal_values_pass_through() {
    assert_eq!(redact_if_sensitive("provider", "dramabox"), "dramabox");
    assert_eq!(redact_if_sensitive("media_id", "41000101"), "41000101");
    assert_eq!(redact_if_sensitive("title", "Love Again"), "Love Again");
}

#[test]
fn test_stream_urls_lose_their_credentials() {
    assert_eq!(
        strip_query("https://cdn.example.com/ep1/index.m3u8?token=abc&expires=1"),
        "https://cdn.example.com/ep1/index.m3u8"
    );
    assert_eq!(
        strip_query("https://cdn.example.com/ep1.mp4#t=30"),
        "https://cdn.example.com/ep1.mp4"
    );
    assert_eq!(strip_query("https://cdn.example.com/ep1.mp4"), "https://cdn.example.com/ep1.mp4");
    assert_eq!(strip_query(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_catalog=debug,core_playback=trace");

    assert_eq!(
        config.filter,
        Some("core_catalog=debug,core_playback=trace".to_string())
    );
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
