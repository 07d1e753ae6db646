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

use iot_historian::protocol::*;
use iot_historian::{Decoder, HistoryRecord, Measurement, RawPayload};
use serde_json::json;

#[test]
fn test_history_window_serialization() {
    let window = HistoryWindow {
        sensor: "temperatura".to_string(),
        labels: vec!["2024-01-01T00:00:00".to_string()],
        values: vec![Some(Measurement::from_json(json!(21.5)).unwrap())],
        unit: "C".to_string(),
    };

    let value = serde_json::to_value(&window).unwrap();
    assert_eq!(
        value,
        json!({
            "sensor": "temperatura",
            "labels": ["2024-01-01T00:00:00"],
            "values": [21.5],
            "unit": "C"
        })
    );

    let parsed: HistoryWindow = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, window);
}

#[test]
fn test_empty_history_window() {
    let window = HistoryWindow::empty("nonexistent_sensor");
    assert!(window.is_empty());
    assert_eq!(
        serde_json::to_value(&window).unwrap(),
        json!({"sensor": "nonexistent_sensor", "labels": [], "values": [], "unit": ""})
    );
}

#[test]
fn test_reading_wire_fields() {
    let payload = br#"{"id": "czujniki-01", "czas": "2024-01-01T00:00:00", "wartosc": 3.5, "jednostka": "m/s"}"#;
    let reading = Decoder::default().decode("iot/czujnik/wiatr_predkosc", payload);

    let value = serde_json::to_value(&reading).unwrap();
    assert_eq!(value["sensor"], "wiatr_predkosc");
    assert_eq!(value["topic"], "iot/czujnik/wiatr_predkosc");
    assert_eq!(value["device_id"], "czujniki-01");
    assert_eq!(value["ts"], "2024-01-01T00:00:00");
    assert_eq!(value["value"], 3.5);
    assert_eq!(value["unit"], "m/s");
    assert_eq!(value["raw"]["wartosc"], 3.5);
}

#[test]
fn test_history_record_layout() {
    let reading = Decoder::default().decode("iot/czujnik/swiatlo", b"broken");
    let record = HistoryRecord { id: 7, reading };

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], 7);
    assert_eq!(value["sensor"], "swiatlo");
    assert_eq!(value["raw"], json!({"raw": "broken"}));
    assert_eq!(value["raw_fallback"], true);
    assert!(value["value"].is_null());

    let parsed: HistoryRecord = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_raw_field_document_is_not_mistaken_for_fallback() {
    let reading = Decoder::default().decode("iot/czujnik/swiatlo", br#"{"raw": "x"}"#);
    assert!(!reading.raw.is_fallback());

    let value = serde_json::to_value(HistoryRecord { id: 1, reading }).unwrap();
    assert_eq!(value["raw"], json!({"raw": "x"}));
    assert!(value.get("raw_fallback").is_none());

    let parsed: HistoryRecord = serde_json::from_value(value).unwrap();
    assert!(!parsed.reading.raw.is_fallback());
    assert!(matches!(parsed.reading.raw, RawPayload::Fields(_)));
}

#[test]
fn test_error_response() {
    let response = ErrorResponse::new("Invalid history query format");
    assert!(!response.success);
    assert_eq!(
        serde_json::to_value(&response).unwrap()["message"],
        "Invalid history query format"
    );
}
