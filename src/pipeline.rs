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

use anyhow::Result;
use bytes::Bytes;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cache::LatestCache;
use crate::config::RetentionConfig;
use crate::decoder::Decoder;
use crate::storage::{HistoryStore, RecordId};

/// Raw message as delivered by the transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Counters since process start
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub messages: u64,
    pub fallbacks: u64,
    pub untracked: u64,
    pub store_errors: u64,
}

/// Decode -> history -> latest cache, the only write path
pub struct IngestPipeline {
    decoder: Decoder,
    cache: Arc<LatestCache>,
    store: Arc<dyn HistoryStore>,
    bound_untracked: bool,

    // Statistics
    messages: AtomicU64,
    fallbacks: AtomicU64,
    untracked: AtomicU64,
    store_errors: AtomicU64,
}

impl IngestPipeline {
    pub fn new(
        decoder: Decoder,
        cache: Arc<LatestCache>,
        store: Arc<dyn HistoryStore>,
        retention: &RetentionConfig,
    ) -> Self {
        Self {
            decoder,
            cache,
            store,
            bound_untracked: retention.bound_untracked,
            messages: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            untracked: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        }
    }

    /// Ingest one message
    ///
    /// Decoding never fails. Tracked sensors are appended and trimmed as one
    /// unit before their cache slot is replaced, so the latest reading is
    /// always already visible in history. Untracked sensors are only trimmed
    /// when `bound_untracked` is set. Storage failures are returned.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Result<RecordId> {
        self.messages.fetch_add(1, Ordering::Relaxed);

        let reading = self.decoder.decode(topic, payload);
        if reading.raw.is_fallback() {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        let sensor_key = reading.sensor_key.clone();
        let tracked = self.cache.is_tracked(&sensor_key);
        if !tracked {
            self.untracked.fetch_add(1, Ordering::Relaxed);
            debug!("Sensor '{}' is not tracked", sensor_key);
        }

        let latest = tracked.then(|| reading.clone());

        let stored = if tracked || self.bound_untracked {
            self.store.append_and_trim(reading).await
        } else {
            self.store.append(reading).await
        };

        let id = stored.inspect_err(|_| {
            self.store_errors.fetch_add(1, Ordering::Relaxed);
        })?;

        if let Some(latest) = latest {
            self.cache.update(&sensor_key, latest);
        }

        Ok(id)
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            messages: self.messages.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            untracked: self.untracked.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }

    /// Drain the transport channel until every sender is dropped
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<InboundMessage>) {
        info!("Ingest worker started");

        while let Some(message) = receiver.recv().await {
            if let Err(e) = self.handle(&message.topic, &message.payload).await {
                error!("Failed to store message from '{}': {:#}", message.topic, e);
            }
        }

        let stats = self.stats();
        info!(
            "Ingest worker stopped: {} messages, {} raw fallbacks, {} untracked, {} store errors",
            stats.messages, stats.fallbacks, stats.untracked, stats.store_errors
        );
    }
}
