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

// Zenoh transport adapter
//
// Subscribes to the sensor-data namespace and forwards every sample into
// the bounded ingest channel. Samples are handed over in delivery order;
// the single ingest worker on the other side serializes all writes.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{info, warn};
use zenoh::Session;

use crate::config::ZenohConfig;
use crate::pipeline::InboundMessage;

/// Translate the YAML zenoh section into a zenoh session config
pub fn build_zenoh_config(config: &ZenohConfig) -> Result<zenoh::Config> {
    let mut zenoh_config = zenoh::Config::default();

    zenoh_config
        .insert_json5("mode", &serde_json::to_string(&config.mode)?)
        .map_err(|e| anyhow!("Invalid zenoh mode '{}': {}", config.mode, e))?;

    if let Some(connect) = &config.connect {
        zenoh_config
            .insert_json5("connect/endpoints", &serde_json::to_string(&connect.endpoints)?)
            .map_err(|e| anyhow!("Invalid connect endpoints: {}", e))?;
    }

    if let Some(listen) = &config.listen {
        zenoh_config
            .insert_json5("listen/endpoints", &serde_json::to_string(&listen.endpoints)?)
            .map_err(|e| anyhow!("Invalid listen endpoints: {}", e))?;
    }

    Ok(zenoh_config)
}

/// Subscriber feeding the ingest channel
pub struct SensorSubscriber {
    session: Session,
    key_expr: String,
    sender: mpsc::Sender<InboundMessage>,
}

impl SensorSubscriber {
    pub fn new(session: Session, key_expr: String, sender: mpsc::Sender<InboundMessage>) -> Self {
        Self {
            session,
            key_expr,
            sender,
        }
    }

    /// Forward samples until the subscription or the channel closes
    pub async fn run(self) -> Result<()> {
        let subscriber = self
            .session
            .declare_subscriber(self.key_expr.as_str())
            .await
            .map_err(|e| anyhow!("Failed to subscribe to '{}': {}", self.key_expr, e))?;

        info!("Subscribed to sensor data on '{}'", self.key_expr);

        while let Ok(sample) = subscriber.recv_async().await {
            let message = InboundMessage {
                topic: sample.key_expr().as_str().to_string(),
                payload: Bytes::from(sample.payload().to_bytes().into_owned()),
            };

            // Waits while the channel is full
            if self.sender.send(message).await.is_err() {
                warn!("Ingest channel closed, stopping subscriber");
                break;
            }
        }

        info!("Subscriber on '{}' stopped", self.key_expr);
        Ok(())
    }
}
