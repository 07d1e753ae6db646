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

use iot_historian::config::PayloadFields;
use iot_historian::{Decoder, Measurement, RawPayload};
use serde_json::json;

#[test]
fn test_decode_well_formed_payload() {
    let payload = br#"{"id": "czujniki-01", "czas": "2024-01-01T00:00:00", "wartosc": 22.4, "jednostka": "C"}"#;
    let reading = Decoder::default().decode("iot/czujnik/temperatura", payload);

    assert_eq!(reading.sensor_key, "temperatura");
    assert_eq!(reading.topic, "iot/czujnik/temperatura");
    assert_eq!(reading.device_id.as_deref(), Some("czujniki-01"));
    assert_eq!(reading.timestamp.as_str(), "2024-01-01T00:00:00");
    assert_eq!(reading.value.as_ref().and_then(Measurement::as_f64), Some(22.4));
    assert_eq!(reading.unit.as_deref(), Some("C"));

    match &reading.raw {
        RawPayload::Fields(fields) => assert_eq!(fields.len(), 4),
        other => panic!("expected structured payload, got {:?}", other),
    }
}

#[test]
fn test_missing_timestamp_is_synthesized() {
    let reading = Decoder::default().decode("iot/czujnik/swiatlo", br#"{"wartosc": 300}"#);

    assert!(reading.timestamp.is_parsed());
    assert!(!reading.timestamp.as_str().contains('.'));
    assert!(reading.device_id.is_none());
    assert!(reading.unit.is_none());
}

#[test]
fn test_null_or_empty_timestamp_is_synthesized() {
    let decoder = Decoder::default();
    for payload in [&br#"{"czas": null}"#[..], &br#"{"czas": ""}"#[..]] {
        let reading = decoder.decode("iot/czujnik/swiatlo", payload);
        assert!(reading.timestamp.is_parsed());
        assert!(!reading.timestamp.as_str().is_empty());
    }
}

#[test]
fn test_non_string_timestamp_is_replaced_by_wall_clock() {
    let decoder = Decoder::default();
    for payload in [
        &br#"{"czas": 1700000000, "wartosc": 1}"#[..],
        &br#"{"czas": true, "wartosc": 1}"#[..],
        &br#"{"czas": {"s": 1}, "wartosc": 1}"#[..],
    ] {
        let reading = decoder.decode("iot/czujnik/cisnienie", payload);
        assert!(reading.timestamp.is_parsed());
        assert_ne!(reading.timestamp.as_str(), "1700000000");
        assert_eq!(reading.timestamp.as_str().len(), "2024-01-01T00:00:00".len());
        // The producer's value is still kept in the raw payload
        assert!(matches!(&reading.raw, RawPayload::Fields(fields) if fields.contains_key("czas")));
    }
}

#[test]
fn test_malformed_payload_falls_back_to_raw_text() {
    let reading = Decoder::default().decode("iot/czujnik/swiatlo", b"lux=300");

    assert_eq!(reading.sensor_key, "swiatlo");
    assert_eq!(reading.raw, RawPayload::Text("lux=300".to_string()));
    assert_eq!(reading.raw.to_value(), json!({"raw": "lux=300"}));
    assert!(reading.value.is_none());
    assert!(reading.unit.is_none());
    assert!(reading.device_id.is_none());
    assert!(reading.timestamp.is_parsed());
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let reading = Decoder::default().decode("iot/czujnik/swiatlo", b"\xff\xfe300");

    match reading.raw {
        RawPayload::Text(text) => {
            assert!(text.contains('\u{FFFD}'));
            assert!(text.ends_with("300"));
        }
        other => panic!("expected raw text, got {:?}", other),
    }
}

#[test]
fn test_non_object_json_is_kept_as_document() {
    let reading = Decoder::default().decode("iot/czujnik/temperatura", b"[1, 2, 3]");

    assert_eq!(reading.raw, RawPayload::Document(json!([1, 2, 3])));
    assert!(reading.value.is_none());
}

#[test]
fn test_non_string_fields() {
    let payload = br#"{"id": 17, "czas": "2024-01-01T00:00:00", "wartosc": "high", "jednostka": null}"#;
    let reading = Decoder::default().decode("iot/czujnik/wiatr_predkosc", payload);

    assert_eq!(reading.device_id.as_deref(), Some("17"));
    assert_eq!(reading.value, Some(Measurement::Other(json!("high"))));
    assert!(reading.unit.is_none());
}

#[test]
fn test_custom_payload_fields() {
    let decoder = Decoder::new(PayloadFields {
        device_id: "device".to_string(),
        timestamp: "ts".to_string(),
        value: "value".to_string(),
        unit: "unit".to_string(),
    });
    let payload = br#"{"device": "d1", "ts": "2024-05-01T10:00:00", "value": 1.5, "unit": "m/s"}"#;
    let reading = decoder.decode("sensors/wind", payload);

    assert_eq!(reading.sensor_key, "wind");
    assert_eq!(reading.device_id.as_deref(), Some("d1"));
    assert_eq!(reading.timestamp.as_str(), "2024-05-01T10:00:00");
    assert_eq!(reading.unit.as_deref(), Some("m/s"));
}

#[test]
fn test_arbitrary_bytes_always_decode() {
    let decoder = Decoder::default();

    // Deterministic pseudo-random payloads
    let mut state: u32 = 0x2545_f491;
    for length in 0..256usize {
        let payload: Vec<u8> = (0..length)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            })
            .collect();

        let reading = decoder.decode("iot/czujnik/temperatura", &payload);
        assert_eq!(reading.sensor_key, "temperatura");
        assert!(!reading.timestamp.as_str().is_empty());
        assert!(serde_json::to_string(&reading).is_ok());
    }
}
