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

// In-memory backend, history is lost on restart

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::HistoryStore;
use super::table::{HistoryRecord, HistoryTable, RecordId};
use crate::reading::Reading;

pub struct MemoryHistoryStore {
    table: RwLock<HistoryTable>,
    max_points: usize,
}

impl MemoryHistoryStore {
    pub fn new(max_points: usize) -> Self {
        Self {
            table: RwLock::new(HistoryTable::new()),
            max_points,
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, reading: Reading) -> Result<RecordId> {
        Ok(self.table.write().await.append(reading))
    }

    async fn trim(&self, sensor_key: &str) -> Result<Vec<RecordId>> {
        let evicted = self.table.write().await.trim(sensor_key, self.max_points);
        if !evicted.is_empty() {
            debug!("Evicted {} records from '{}'", evicted.len(), sensor_key);
        }
        Ok(evicted)
    }

    async fn append_and_trim(&self, reading: Reading) -> Result<RecordId> {
        let sensor_key = reading.sensor_key.clone();
        let mut table = self.table.write().await;
        let id = table.append(reading);
        let evicted = table.trim(&sensor_key, self.max_points);
        if !evicted.is_empty() {
            debug!("Evicted {} records from '{}'", evicted.len(), sensor_key);
        }
        Ok(id)
    }

    async fn query(&self, sensor_key: &str) -> Result<Vec<HistoryRecord>> {
        Ok(self.table.read().await.records(sensor_key).to_vec())
    }

    async fn tail(&self, sensor_key: &str, n: usize) -> Result<Vec<HistoryRecord>> {
        Ok(self.table.read().await.tail(sensor_key, n).to_vec())
    }

    async fn count(&self, sensor_key: &str) -> Result<usize> {
        Ok(self.table.read().await.count(sensor_key))
    }

    async fn sensors(&self) -> Result<Vec<String>> {
        Ok(self.table.read().await.sensors())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn max_points(&self) -> usize {
        self.max_points
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}
