//! The HTTP response as seen by the validator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status, lower-cased headers, decoded body and timing of one call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualResponse {
    pub status: u16,

    #[serde(default, deserialize_with = "lowercase_headers")]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub data: Value,

    /// Elapsed time in milliseconds, when the client measured it.
    /// Fractional values are rounded.
    #[serde(
        default,
        alias = "duration",
        deserialize_with = "rounded_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
}

impl ActualResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn lowercase_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect())
}

fn rounded_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(ms.round() as u64)),
        Some(ms) => Err(serde::de::Error::custom(format!(
            "duration must be a non-negative number of milliseconds, got {}",
            ms
        ))),
    }
}
