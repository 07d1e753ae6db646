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

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{debug, error, info};
use zenoh::query::Query;
use zenoh::Session;

use crate::protocol::ErrorResponse;
use crate::query::{parse_points, QueryService};

/// Sensor named by a history key, `<prefix>/history/<sensor>`
pub fn sensor_from_history_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let sensor = key
        .strip_prefix(prefix.trim_end_matches('/'))?
        .strip_prefix("/history/")?;
    if sensor.is_empty() || sensor.contains('/') {
        None
    } else {
        Some(sensor)
    }
}

/// Query interface serving latest snapshots and history windows via Zenoh queryables
///
/// - `<prefix>/latest` -> JSON object of tracked sensor -> reading or null
/// - `<prefix>/history/<sensor>?n=<N>` -> JSON history window
pub struct QueryInterface {
    session: Session,
    service: Arc<QueryService>,
    key_prefix: String,
}

impl QueryInterface {
    pub fn new(session: Session, service: Arc<QueryService>, key_prefix: String) -> Self {
        Self {
            session,
            service,
            key_prefix: key_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Run the query interface (blocks until stopped)
    pub async fn run(&self) -> Result<()> {
        let latest_key = format!("{}/latest", self.key_prefix);
        let latest_queryable = self
            .session
            .declare_queryable(latest_key.as_str())
            .await
            .map_err(|e| anyhow!("{}", e))?;

        info!("Latest snapshot queries on '{}'", latest_key);

        let history_key = format!("{}/history/*", self.key_prefix);
        let history_queryable = self
            .session
            .declare_queryable(history_key.as_str())
            .await
            .map_err(|e| anyhow!("{}", e))?;

        info!("History queries on '{}'", history_key);

        // Handle queries in parallel
        loop {
            tokio::select! {
                Ok(query) = latest_queryable.recv_async() => {
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_latest_query(query, service).await {
                            error!("Error handling latest query: {}", e);
                        }
                    });
                }
                Ok(query) = history_queryable.recv_async() => {
                    let service = self.service.clone();
                    let prefix = self.key_prefix.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_history_query(query, service, prefix).await {
                            error!("Error handling history query: {}", e);
                        }
                    });
                }
                else => break,
            }
        }

        info!("Query interface stopped");
        Ok(())
    }

    async fn handle_latest_query(query: Query, service: Arc<QueryService>) -> Result<()> {
        debug!("Received latest query on '{}'", query.selector());

        let response_bytes = serde_json::to_vec(&service.latest())?;
        query
            .reply(query.key_expr().clone(), response_bytes)
            .await
            .map_err(|e| anyhow!("{}", e))?;

        Ok(())
    }

    async fn handle_history_query(
        query: Query,
        service: Arc<QueryService>,
        prefix: String,
    ) -> Result<()> {
        debug!("Received history query on '{}'", query.selector());

        let Some(sensor) = sensor_from_history_key(&prefix, query.key_expr().as_str()) else {
            let response = ErrorResponse::new("Invalid history query format");
            query
                .reply_err(serde_json::to_vec(&response)?)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            return Ok(());
        };

        let n = parse_points(query.parameters().get("n"));

        match service.history(sensor, n).await {
            Ok(window) => {
                if window.is_empty() {
                    debug!("No history for '{}'", sensor);
                } else {
                    debug!("Replying with {} points for '{}'", window.len(), sensor);
                }
                let response_bytes = serde_json::to_vec(&window)?;
                query
                    .reply(query.key_expr().clone(), response_bytes)
                    .await
                    .map_err(|e| anyhow!("{}", e))?;
            }
            Err(e) => {
                error!("History lookup for '{}' failed: {:#}", sensor, e);
                let response = ErrorResponse::new(format!("History unavailable: {}", e));
                query
                    .reply_err(serde_json::to_vec(&response)?)
                    .await
                    .map_err(|e| anyhow!("{}", e))?;
            }
        }

        Ok(())
    }
}
