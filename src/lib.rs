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

// IoT sensor historian over Zenoh
//
// This service:
// - Subscribes to periodic scalar sensor readings
// - Decodes payloads, falling back to raw text instead of failing
// - Caches the latest reading of each tracked sensor
// - Keeps a bounded, timestamp-ordered history per sensor
// - Serves latest snapshots and trailing history windows via Zenoh queryables

pub mod api;
pub mod cache;
pub mod config;
pub mod decoder;
pub mod pipeline;
pub mod protocol;
pub mod query;
pub mod reading;
pub mod storage;
pub mod transport;

// Re-export main types
pub use api::QueryInterface;
pub use cache::LatestCache;
pub use config::{load_config, load_config_with_env, HistorianConfig};
pub use decoder::{sensor_key_from_topic, Decoder};
pub use pipeline::{InboundMessage, IngestPipeline, IngestStats};
pub use protocol::{ErrorResponse, HistoryWindow, LatestSnapshot};
pub use query::{QueryService, DEFAULT_HISTORY_POINTS};
pub use reading::{Measurement, RawPayload, Reading, Timestamp, MAX_POINTS_PER_SENSOR};
pub use storage::{BackendFactory, HistoryRecord, HistoryStore, RecordId};
pub use transport::{build_zenoh_config, SensorSubscriber};
