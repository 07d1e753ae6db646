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

// Per-sensor history table shared by all backends
//
// Each sensor's records are kept sorted by (timestamp, id). Ids grow
// monotonically, so equal timestamps keep insertion order and eviction
// from the front always removes the oldest entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::reading::Reading;

/// Store-assigned record identifier
pub type RecordId = u64;

/// A persisted reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub reading: Reading,
}

#[derive(Debug, Default)]
pub struct HistoryTable {
    sensors: HashMap<String, Vec<HistoryRecord>>,
    next_id: RecordId,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from previously persisted records
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = HistoryRecord>,
    {
        let mut table = Self::new();
        for record in records {
            table.next_id = table.next_id.max(record.id + 1);
            table
                .sensors
                .entry(record.reading.sensor_key.clone())
                .or_default()
                .push(record);
        }
        for records in table.sensors.values_mut() {
            records.sort_by(|a, b| {
                a.reading
                    .timestamp
                    .cmp(&b.reading.timestamp)
                    .then(a.id.cmp(&b.id))
            });
        }
        table
    }

    pub fn append(&mut self, reading: Reading) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;

        let records = self.sensors.entry(reading.sensor_key.clone()).or_default();
        insert_sorted(records, HistoryRecord { id, reading });
        id
    }

    /// Evict the oldest records of `sensor_key` beyond `max_points`.
    /// Returns the ids removed, oldest first.
    pub fn trim(&mut self, sensor_key: &str, max_points: usize) -> Vec<RecordId> {
        let Some(records) = self.sensors.get_mut(sensor_key) else {
            return Vec::new();
        };

        let evicted = evict_oldest(records, max_points);
        if records.is_empty() {
            self.sensors.remove(sensor_key);
        }
        evicted
    }

    /// Copy of one sensor's records that can be changed without touching
    /// the table until `commit`
    pub fn stage(&self, sensor_key: &str) -> StagedRecords {
        StagedRecords {
            sensor_key: sensor_key.to_string(),
            records: self.records(sensor_key).to_vec(),
            next_id: self.next_id,
        }
    }

    /// Replace the sensor's records with a staged copy
    pub fn commit(&mut self, staged: StagedRecords) {
        self.next_id = self.next_id.max(staged.next_id);
        if staged.records.is_empty() {
            self.sensors.remove(&staged.sensor_key);
        } else {
            self.sensors.insert(staged.sensor_key, staged.records);
        }
    }

    /// Records of one sensor, ascending by timestamp
    pub fn records(&self, sensor_key: &str) -> &[HistoryRecord] {
        self.sensors
            .get(sensor_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The last `n` records of one sensor, ascending by timestamp
    pub fn tail(&self, sensor_key: &str, n: usize) -> &[HistoryRecord] {
        let records = self.records(sensor_key);
        &records[records.len().saturating_sub(n)..]
    }

    pub fn count(&self, sensor_key: &str) -> usize {
        self.records(sensor_key).len()
    }

    pub fn total(&self) -> usize {
        self.sensors.values().map(Vec::len).sum()
    }

    pub fn sensors(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sensors.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Pending edit of one sensor's records, see `HistoryTable::stage`
#[derive(Debug)]
pub struct StagedRecords {
    sensor_key: String,
    records: Vec<HistoryRecord>,
    next_id: RecordId,
}

impl StagedRecords {
    pub fn sensor_key(&self) -> &str {
        &self.sensor_key
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Append a reading of this sensor. Ids are taken from the table's
    /// sequence, so only one stage may be open per table at a time.
    pub fn append(&mut self, reading: Reading) -> RecordId {
        debug_assert_eq!(reading.sensor_key, self.sensor_key);
        let id = self.next_id;
        self.next_id += 1;
        insert_sorted(&mut self.records, HistoryRecord { id, reading });
        id
    }

    pub fn trim(&mut self, max_points: usize) -> Vec<RecordId> {
        evict_oldest(&mut self.records, max_points)
    }
}

fn insert_sorted(records: &mut Vec<HistoryRecord>, record: HistoryRecord) {
    // Later ids go after equal timestamps
    let position = records.partition_point(|r| r.reading.timestamp <= record.reading.timestamp);
    records.insert(position, record);
}

fn evict_oldest(records: &mut Vec<HistoryRecord>, max_points: usize) -> Vec<RecordId> {
    if records.len() <= max_points {
        return Vec::new();
    }
    let excess = records.len() - max_points;
    records.drain(..excess).map(|r| r.id).collect()
}
