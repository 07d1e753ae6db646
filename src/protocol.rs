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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::reading::{Measurement, Reading};

/// Reply to a latest-snapshot query: every tracked key, `null` until the
/// first reading arrives
pub type LatestSnapshot = BTreeMap<String, Option<Reading>>;

/// Reply to a history query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryWindow {
    pub sensor: String,
    /// Timestamps, ascending
    pub labels: Vec<String>,
    /// Values aligned with `labels`, `null` where a reading had none
    pub values: Vec<Option<Measurement>>,
    /// Unit of the most recent record, empty when unknown
    pub unit: String,
}

impl HistoryWindow {
    pub fn empty(sensor: impl Into<String>) -> Self {
        Self {
            sensor: sensor.into(),
            labels: Vec::new(),
            values: Vec::new(),
            unit: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Reply sent when a query cannot be answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
