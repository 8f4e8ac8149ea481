use serde::Deserialize;
use std::time::Duration;

/// Settings of a [`SelfHostServer`](crate::SelfHostServer).
///
/// Every field has a default, so a partial document deserializes fine. Durations
/// are written as milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Requests slower than this are logged at `WARN` instead of `DEBUG`.
    #[serde(deserialize_with = "octet_http::config::duration_ms")]
    pub slow_request_threshold: Duration,

    /// Keep HTTP/1.1 connections open between requests.
    pub keep_alive: bool,

    /// How long a connection may take to send its request head.
    #[serde(deserialize_with = "octet_http::config::duration_ms")]
    pub header_read_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { slow_request_threshold: Duration::from_millis(200), keep_alive: true, header_read_timeout: Duration::from_secs(30) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.slow_request_threshold, Duration::from_millis(200));
        assert!(config.keep_alive);
    }

    #[test]
    fn test_partial_document() {
        let config: ServerConfig = serde_json::from_str(r#"{"slow_request_threshold": 50}"#).unwrap();
        assert_eq!(config.slow_request_threshold, Duration::from_millis(50));
        assert!(config.keep_alive);
        assert_eq!(config.header_read_timeout, Duration::from_secs(30));
    }
}
