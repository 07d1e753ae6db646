// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Sensor reading data model

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Maximum number of history records retained per sensor key
pub const MAX_POINTS_PER_SENSOR: usize = 600;

/// Accepted layouts for timestamps without an explicit UTC offset.
/// `%.f` also matches an absent fractional part.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("unrecognized timestamp format: '{0}'")]
    Format(String),
}

/// Sample timestamp.
///
/// The producer's text is kept verbatim for output. Ordering uses the parsed
/// instant only, so `2024-01-01T00:00:00` and `2024-01-01 00:00:00.000` are
/// equal. Text that cannot be parsed sorts before every parsed instant and
/// lexicographically among itself.
#[derive(Debug, Clone)]
pub struct Timestamp {
    text: String,
    instant: Option<NaiveDateTime>,
}

impl Timestamp {
    /// Wrap producer text, parsing it when it looks like ISO-8601
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let instant = parse_instant(&text).ok();
        Self { text, instant }
    }

    /// Local wall clock truncated to whole seconds
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        Self {
            text: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            instant: Some(now),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn instant(&self) -> Option<NaiveDateTime> {
        self.instant
    }

    pub fn is_parsed(&self) -> bool {
        self.instant.is_some()
    }
}

/// Parse ISO-8601 text into a local naive instant.
///
/// Values carrying an offset are converted to local time so they compare
/// against the naive local timestamps sensors usually emit.
pub fn parse_instant(text: &str) -> Result<NaiveDateTime, TimestampError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Ok(with_offset.with_timezone(&Local).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| TimestampError::Format(text.to_string()))
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.instant, other.instant) {
            (Some(a), Some(b)) => a.cmp(&b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Timestamp::parse(text))
    }
}

/// Measured value of a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Number(Number),
    /// Strings, booleans or nested structures passed through untouched
    Other(Value),
}

impl Measurement {
    /// `None` for JSON null
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => Some(Measurement::Number(number)),
            other => Some(Measurement::Other(other)),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Measurement::Number(number) => number.as_f64(),
            Measurement::Other(_) => None,
        }
    }
}

/// Full inbound payload kept on every reading
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Key-value document the well-known fields were read from
    Fields(Map<String, Value>),
    /// Valid JSON that is not a key-value document
    Document(Value),
    /// Payload text that could not be parsed, invalid UTF-8 replaced
    Text(String),
}

impl RawPayload {
    /// JSON form used on the wire and on disk. Unparseable text is wrapped
    /// as `{"raw": <text>}`.
    pub fn to_value(&self) -> Value {
        match self {
            RawPayload::Fields(fields) => Value::Object(fields.clone()),
            RawPayload::Document(value) => value.clone(),
            RawPayload::Text(text) => json!({ "raw": text }),
        }
    }

    /// Inverse of `to_value`. `fallback` tells a wrapped raw text apart
    /// from a genuine `{"raw": ...}` document.
    pub fn from_value(value: Value, fallback: bool) -> Self {
        match value {
            Value::Object(fields) => match fields.get("raw") {
                Some(Value::String(text)) if fallback && fields.len() == 1 => {
                    RawPayload::Text(text.clone())
                }
                _ => RawPayload::Fields(fields),
            },
            other => RawPayload::Document(other),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RawPayload::Text(_))
    }
}

/// Serialized next to the other reading fields as `raw`, plus
/// `raw_fallback: true` for unparseable text
#[derive(Serialize, Deserialize)]
struct RawFields {
    raw: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    raw_fallback: bool,
}

impl Serialize for RawPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawFields {
            raw: self.to_value(),
            raw_fallback: self.is_fallback(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = RawFields::deserialize(deserializer)?;
        Ok(RawPayload::from_value(fields.raw, fields.raw_fallback))
    }
}

/// One decoded inbound sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "sensor")]
    pub sensor_key: String,
    pub topic: String,
    pub device_id: Option<String>,
    #[serde(rename = "ts")]
    pub timestamp: Timestamp,
    pub value: Option<Measurement>,
    pub unit: Option<String>,
    #[serde(flatten)]
    pub raw: RawPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naive_iso() {
        let ts = Timestamp::parse("2024-01-01T12:30:05");
        assert!(ts.is_parsed());
        assert_eq!(ts.as_str(), "2024-01-01T12:30:05");
    }

    #[test]
    fn test_parse_fractional_and_space_separator() {
        assert!(parse_instant("2024-01-01T12:30:05.250").is_ok());
        assert!(parse_instant("2024-01-01 12:30:05").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_instant("  "), Err(TimestampError::Empty));
        assert!(matches!(
            parse_instant("yesterday"),
            Err(TimestampError::Format(_))
        ));
    }

    #[test]
    fn test_ordering_uses_instant_not_text() {
        // Lexicographically "2024-01-01T9..." would sort after "...T10..."
        let earlier = Timestamp::parse("2024-01-01 09:00:00");
        let later = Timestamp::parse("2024-01-01T10:00:00");
        assert!(earlier < later);
    }

    #[test]
    fn test_same_instant_different_text_is_equal() {
        let t = Timestamp::parse("2024-01-01T00:00:00");
        let space = Timestamp::parse("2024-01-01 00:00:00");
        let fraction = Timestamp::parse("2024-01-01T00:00:00.000");
        assert_eq!(t.cmp(&space), Ordering::Equal);
        assert_eq!(t.cmp(&fraction), Ordering::Equal);
        assert_eq!(space.as_str(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_unparsed_sorts_first() {
        let garbage = Timestamp::parse("not-a-time");
        let parsed = Timestamp::parse("1970-01-01T00:00:00");
        assert!(garbage < parsed);
    }

    #[test]
    fn test_now_is_whole_seconds() {
        let now = Timestamp::now();
        assert_eq!(now.instant().map(|i| i.nanosecond()), Some(0));
        assert_eq!(now.as_str().len(), "2024-01-01T00:00:00".len());
    }

    #[test]
    fn test_raw_payload_text_shape() {
        let raw = RawPayload::Text("oops".to_string());
        assert_eq!(raw.to_value(), json!({"raw": "oops"}));
        assert_eq!(RawPayload::from_value(raw.to_value(), true), raw);
    }

    #[test]
    fn test_raw_document_that_looks_like_fallback() {
        let genuine = RawPayload::Fields(Map::from_iter([("raw".to_string(), json!("x"))]));
        let fallback = RawPayload::Text("x".to_string());
        assert_eq!(genuine.to_value(), fallback.to_value());

        assert_eq!(RawPayload::from_value(genuine.to_value(), false), genuine);
        assert_eq!(RawPayload::from_value(fallback.to_value(), true), fallback);
    }

    #[test]
    fn test_measurement_keeps_integers() {
        let value = Measurement::from_json(json!(45)).unwrap();
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(45));
        assert_eq!(value.as_f64(), Some(45.0));
        assert!(Measurement::from_json(Value::Null).is_none());
    }
}
