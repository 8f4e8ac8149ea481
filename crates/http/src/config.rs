//! Helpers for configuration structs that are loaded with `serde`.

use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Deserializes a [`Duration`] written as whole milliseconds.
///
/// ```ignore
/// #[serde(deserialize_with = "octet_http::config::duration_ms")]
/// timeout: Duration,
/// ```
pub fn duration_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
