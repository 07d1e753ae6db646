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

use dashmap::DashMap;
use std::collections::BTreeMap;

use crate::reading::Reading;

/// Latest reading per tracked sensor key
///
/// Slots exist only for the keys given at construction; updates to any other
/// key are ignored. Each slot is last-write-wins and starts empty.
pub struct LatestCache {
    slots: DashMap<String, Option<Reading>>,
}

impl LatestCache {
    pub fn new<I, S>(tracked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = DashMap::new();
        for key in tracked {
            slots.insert(key.into(), None);
        }
        Self { slots }
    }

    pub fn is_tracked(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Overwrite the slot for `key`. Returns false when `key` is not tracked.
    pub fn update(&self, key: &str, reading: Reading) -> bool {
        match self.slots.get_mut(key) {
            Some(mut slot) => {
                *slot = Some(reading);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<Reading> {
        self.slots.get(key).and_then(|slot| slot.value().clone())
    }

    /// Every tracked key with its last reading, `None` until the first one arrives
    pub fn snapshot(&self) -> BTreeMap<String, Option<Reading>> {
        self.slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn tracked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;

    fn reading(topic: &str, payload: &str) -> Reading {
        Decoder::default().decode(topic, payload.as_bytes())
    }

    #[test]
    fn test_snapshot_starts_empty() {
        let cache = LatestCache::new(["temperatura", "swiatlo"]);
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.values().all(Option::is_none));
        assert_eq!(cache.tracked_keys(), vec!["swiatlo", "temperatura"]);
    }

    #[test]
    fn test_update_ignores_untracked() {
        let cache = LatestCache::new(["temperatura"]);
        assert!(!cache.update("cisnienie", reading("iot/czujnik/cisnienie", "{}")));
        assert!(!cache.is_tracked("cisnienie"));
        assert_eq!(cache.snapshot().len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = LatestCache::new(["temperatura"]);
        cache.update("temperatura", reading("iot/czujnik/temperatura", r#"{"wartosc": 1}"#));
        cache.update("temperatura", reading("iot/czujnik/temperatura", r#"{"wartosc": 2}"#));

        let latest = cache.get("temperatura").unwrap();
        assert_eq!(latest.value.and_then(|v| v.as_f64()), Some(2.0));
    }
}
