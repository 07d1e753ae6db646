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

// Configuration types for iot-historian

use crate::reading::MAX_POINTS_PER_SENSOR;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistorianConfig {
    #[serde(default)]
    pub zenoh: ZenohConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Zenoh configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZenohConfig {
    #[serde(default = "default_mode")]
    pub mode: String,  // "peer", "client", or "router"

    #[serde(default)]
    pub connect: Option<ConnectConfig>,

    #[serde(default)]
    pub listen: Option<ListenConfig>,
}

impl Default for ZenohConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            connect: None,
            listen: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectConfig {
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    pub endpoints: Vec<String>,
}

/// Inbound message settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Key expression covering the sensor-data namespace
    #[serde(default = "default_subscribe_key")]
    pub subscribe_key: String,

    /// Capacity of the channel between the subscriber and the ingest worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub payload_fields: PayloadFields,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            subscribe_key: default_subscribe_key(),
            queue_capacity: default_queue_capacity(),
            payload_fields: PayloadFields::default(),
        }
    }
}

/// Names of the well-known fields inside a sensor payload
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PayloadFields {
    #[serde(default = "default_device_id_field")]
    pub device_id: String,
    #[serde(default = "default_timestamp_field")]
    pub timestamp: String,
    #[serde(default = "default_value_field")]
    pub value: String,
    #[serde(default = "default_unit_field")]
    pub unit: String,
}

impl Default for PayloadFields {
    fn default() -> Self {
        Self {
            device_id: default_device_id_field(),
            timestamp: default_timestamp_field(),
            value: default_value_field(),
            unit: default_unit_field(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorsConfig {
    /// Sensor keys whose latest value is cached and whose history is bounded
    #[serde(default = "default_tracked_sensors")]
    pub tracked: Vec<String>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            tracked: default_tracked_sensors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_max_points")]
    pub max_points_per_sensor: usize,

    /// Apply the cap to sensor keys outside the tracked set as well
    #[serde(default)]
    pub bound_untracked: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_points_per_sensor: default_max_points(),
            bound_untracked: false,
        }
    }
}

/// History storage selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend type: "memory" or "filesystem"
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub filesystem: Option<FilesystemConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            filesystem: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    pub base_path: String,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: "/var/lib/iot-historian".to_string(),
        }
    }
}

/// Query interface settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_history_points")]
    pub default_history_points: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_api_prefix(),
            default_history_points: default_history_points(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,  // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String,  // "text", "compact"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_mode() -> String { "peer".to_string() }
fn default_subscribe_key() -> String { "iot/czujnik/**".to_string() }
fn default_queue_capacity() -> usize { 1024 }
fn default_device_id_field() -> String { "id".to_string() }
fn default_timestamp_field() -> String { "czas".to_string() }
fn default_value_field() -> String { "wartosc".to_string() }
fn default_unit_field() -> String { "jednostka".to_string() }
fn default_max_points() -> usize { MAX_POINTS_PER_SENSOR }
fn default_backend() -> String { "memory".to_string() }
fn default_api_prefix() -> String { "iot/api".to_string() }
fn default_history_points() -> usize { 120 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }

fn default_tracked_sensors() -> Vec<String> {
    ["temperatura", "wilgotnosc", "swiatlo", "wiatr_kierunek", "wiatr_predkosc"]
        .iter()
        .map(|key| key.to_string())
        .collect()
}
