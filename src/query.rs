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

// Read path composed from the latest cache and the history store

use anyhow::Result;
use std::sync::Arc;

use crate::cache::LatestCache;
use crate::protocol::{HistoryWindow, LatestSnapshot};
use crate::storage::HistoryStore;

/// Window size used when a request gives none or an invalid one
pub const DEFAULT_HISTORY_POINTS: usize = 120;

/// Parse the `n` request parameter; anything that is not an integer is ignored
pub fn parse_points(param: Option<&str>) -> Option<i64> {
    param.and_then(|raw| raw.trim().parse().ok())
}

/// Positive `n` is used as is, anything else falls back to `default`
pub fn resolve_points(n: Option<i64>, default: usize) -> usize {
    match n {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => default,
    }
}

pub struct QueryService {
    cache: Arc<LatestCache>,
    store: Arc<dyn HistoryStore>,
    default_points: usize,
}

impl QueryService {
    pub fn new(cache: Arc<LatestCache>, store: Arc<dyn HistoryStore>) -> Self {
        Self::with_default_points(cache, store, DEFAULT_HISTORY_POINTS)
    }

    pub fn with_default_points(
        cache: Arc<LatestCache>,
        store: Arc<dyn HistoryStore>,
        default_points: usize,
    ) -> Self {
        Self {
            cache,
            store,
            default_points,
        }
    }

    pub fn latest(&self) -> LatestSnapshot {
        self.cache.snapshot()
    }

    /// The last `n` samples of a sensor, oldest first
    ///
    /// Unknown sensors and sensors without history yield an empty window.
    pub async fn history(&self, sensor_key: &str, n: Option<i64>) -> Result<HistoryWindow> {
        let n = resolve_points(n, self.default_points);
        let records = self.store.tail(sensor_key, n).await?;

        let mut window = HistoryWindow::empty(sensor_key);
        if let Some(last) = records.last() {
            window.unit = last.reading.unit.clone().unwrap_or_default();
        }
        for record in records {
            window.labels.push(record.reading.timestamp.as_str().to_string());
            window.values.push(record.reading.value);
        }

        Ok(window)
    }
}
