use serde::Deserialize;
use std::time::Duration;

/// Settings of a [`TypedHttpClient`](crate::TypedHttpClient) and its
/// [`ConnectionPool`](crate::ConnectionPool), fixed at construction.
///
/// Durations are written as milliseconds when deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Covers the whole exchange, sending the request and reading the full body.
    #[serde(deserialize_with = "octet_http::config::duration_ms")]
    pub timeout: Duration,

    /// Answer `404 Not Found` with an empty reply instead of an error.
    pub not_found_as_empty: bool,

    #[serde(deserialize_with = "octet_http::config::duration_ms")]
    pub pool_idle_timeout: Duration,

    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            not_found_as_empty: false,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: usize::MAX,
        }
    }
}
