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

// History storage backend trait

use anyhow::Result;
use async_trait::async_trait;

use super::table::{HistoryRecord, RecordId};
use crate::reading::Reading;

/// Per-sensor history with bounded retention
///
/// Implementations serialize writers and readers so that a reader never sees
/// a half-applied append or an append whose trim has not run yet. A read that
/// starts after a write returned observes that write.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Initialize the backend (create directories, load persisted records)
    async fn initialize(&self) -> Result<()>;

    /// Persist a reading without applying retention
    async fn append(&self, reading: Reading) -> Result<RecordId>;

    /// Evict the oldest records of `sensor_key` until at most
    /// `max_points()` remain. Returns the evicted ids.
    async fn trim(&self, sensor_key: &str) -> Result<Vec<RecordId>>;

    /// Append and trim the reading's sensor as one unit
    async fn append_and_trim(&self, reading: Reading) -> Result<RecordId>;

    /// All records of a sensor, ascending by timestamp
    async fn query(&self, sensor_key: &str) -> Result<Vec<HistoryRecord>>;

    /// The last `n` records of a sensor, ascending by timestamp
    async fn tail(&self, sensor_key: &str, n: usize) -> Result<Vec<HistoryRecord>> {
        let mut records = self.query(sensor_key).await?;
        let start = records.len().saturating_sub(n);
        Ok(records.split_off(start))
    }

    /// Number of records held for a sensor
    async fn count(&self, sensor_key: &str) -> Result<usize>;

    /// Sensor keys with at least one record
    async fn sensors(&self) -> Result<Vec<String>>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Retention cap applied by `trim`
    fn max_points(&self) -> usize;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}
