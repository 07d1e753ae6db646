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

// Payload decoding
//
// Every inbound message yields exactly one Reading. Payloads that do not
// parse fall back to a raw-text record instead of failing.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PayloadFields;
use crate::reading::{Measurement, RawPayload, Reading, Timestamp};

/// Sensor key used when a topic has no usable path segment
pub const UNKNOWN_SENSOR_KEY: &str = "unknown";

#[derive(Debug, Error)]
enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Derive the sensor key from the last non-empty path segment of a topic
///
/// `iot/czujnik/temperatura` -> `temperatura`
pub fn sensor_key_from_topic(topic: &str) -> String {
    topic
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(UNKNOWN_SENSOR_KEY)
        .to_string()
}

/// Decodes raw `(topic, payload)` pairs into readings
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    fields: PayloadFields,
}

impl Decoder {
    pub fn new(fields: PayloadFields) -> Self {
        Self { fields }
    }

    pub fn decode(&self, topic: &str, payload: &[u8]) -> Reading {
        let sensor_key = sensor_key_from_topic(topic);
        let text = String::from_utf8_lossy(payload).into_owned();

        match parse_document(&text) {
            Ok(Value::Object(fields)) => self.read_fields(sensor_key, topic, fields),
            Ok(document) => {
                debug!(
                    "Payload on '{}' is JSON but not an object, keeping it as raw document",
                    topic
                );
                bare_reading(sensor_key, topic, RawPayload::Document(document))
            }
            Err(e) => {
                warn!("Falling back to raw text for '{}': {}", topic, e);
                bare_reading(sensor_key, topic, RawPayload::Text(text))
            }
        }
    }

    fn read_fields(&self, sensor_key: String, topic: &str, fields: Map<String, Value>) -> Reading {
        let timestamp = match fields.get(&self.fields.timestamp) {
            Some(Value::String(text)) if !text.is_empty() => Timestamp::parse(text.as_str()),
            _ => Timestamp::now(),
        };

        if !timestamp.is_parsed() {
            debug!(
                "Timestamp '{}' on '{}' is not ISO-8601, ordering it before parsed ones",
                timestamp, topic
            );
        }

        Reading {
            sensor_key,
            topic: topic.to_string(),
            device_id: fields.get(&self.fields.device_id).and_then(scalar_text),
            timestamp,
            value: fields
                .get(&self.fields.value)
                .cloned()
                .and_then(Measurement::from_json),
            unit: fields.get(&self.fields.unit).and_then(scalar_text),
            raw: RawPayload::Fields(fields),
        }
    }
}

fn parse_document(text: &str) -> Result<Value, DecodeError> {
    Ok(serde_json::from_str(text)?)
}

/// Reading with only the always-present fields filled in
fn bare_reading(sensor_key: String, topic: &str, raw: RawPayload) -> Reading {
    Reading {
        sensor_key,
        topic: topic.to_string(),
        device_id: None,
        timestamp: Timestamp::now(),
        value: None,
        unit: None,
        raw,
    }
}

/// Strings pass through, numbers and booleans are rendered, anything else is dropped
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
