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

// Filesystem backend implementation
//
// One JSON document per sensor key under `base_path`. Documents are
// rewritten through a temporary file and a rename after every mutation,
// so a crash leaves either the old or the new document on disk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::backend::HistoryStore;
use super::table::{HistoryRecord, HistoryTable, RecordId, StagedRecords};
use crate::config::FilesystemConfig;
use crate::reading::Reading;

const DOCUMENT_EXTENSION: &str = ".json";

#[derive(Serialize)]
struct SensorDocumentRef<'a> {
    sensor: &'a str,
    records: &'a [HistoryRecord],
}

#[derive(Deserialize)]
struct SensorDocument {
    sensor: String,
    records: Vec<HistoryRecord>,
}

/// File name holding the history of `sensor_key`
///
/// Bytes outside `[A-Za-z0-9_-]` are escaped as `%XX`, keeping distinct
/// keys in distinct files.
pub fn sensor_file_name(sensor_key: &str) -> String {
    let mut name = String::with_capacity(sensor_key.len() + DOCUMENT_EXTENSION.len());
    for byte in sensor_key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(byte as char),
            other => name.push_str(&format!("%{:02X}", other)),
        }
    }
    name.push_str(DOCUMENT_EXTENSION);
    name
}

/// Filesystem backend persisting per-sensor history as JSON
pub struct FilesystemHistoryStore {
    base_path: PathBuf,
    table: RwLock<HistoryTable>,
    max_points: usize,
}

impl FilesystemHistoryStore {
    pub fn new(config: FilesystemConfig, max_points: usize) -> Result<Self> {
        let base_path = PathBuf::from(&config.base_path);

        info!(
            "Initializing filesystem history at: {}",
            base_path.display()
        );

        Ok(Self {
            base_path,
            table: RwLock::new(HistoryTable::new()),
            max_points,
        })
    }

    /// Ensure base directory exists
    async fn ensure_base_directory(&self) -> Result<()> {
        if !self.base_path.exists() {
            info!("Creating base directory: {}", self.base_path.display());
            fs::create_dir_all(&self.base_path)
                .await
                .context("Failed to create base directory")?;
        }
        Ok(())
    }

    fn sensor_path(&self, sensor_key: &str) -> PathBuf {
        self.base_path.join(sensor_file_name(sensor_key))
    }

    /// Read every sensor document under the base directory
    async fn load_records(&self) -> Result<Vec<HistoryRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .context("Failed to list history directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(DOCUMENT_EXTENSION));
            if !is_document {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read history file: {}", path.display()))?;
            let document: SensorDocument = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse history file: {}", path.display()))?;

            debug!(
                "Loaded {} records for '{}' from {}",
                document.records.len(),
                document.sensor,
                path.display()
            );
            records.extend(document.records);
        }

        Ok(records)
    }

    /// Write the staged records of one sensor to its document
    async fn persist(&self, staged: &StagedRecords) -> Result<()> {
        let path = self.sensor_path(staged.sensor_key());
        let records = staged.records();

        if records.is_empty() {
            match fs::remove_file(&path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    return Err(e).context(format!("Failed to remove {}", path.display()));
                }
                _ => return Ok(()),
            }
        }

        let document = SensorDocumentRef {
            sensor: staged.sensor_key(),
            records,
        };
        let data = serde_json::to_vec_pretty(&document)
            .context("Failed to serialize sensor history")?;
        replace_file(&path, &data).await?;

        debug!(
            "Wrote {} records ({} bytes) to {}",
            records.len(),
            data.len(),
            path.display()
        );
        Ok(())
    }
}

/// Replace `path` with `data` through a synced temporary file and a rename
async fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut temp_path = path.to_path_buf().into_os_string();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let mut file = fs::File::create(&temp_path)
        .await
        .context(format!("Failed to create file: {}", temp_path.display()))?;
    file.write_all(data)
        .await
        .context(format!("Failed to write {}", temp_path.display()))?;
    file.sync_all()
        .await
        .context(format!("Failed to sync {}", temp_path.display()))?;

    fs::rename(&temp_path, path)
        .await
        .context(format!("Failed to replace {}", path.display()))
}

#[async_trait]
impl HistoryStore for FilesystemHistoryStore {
    async fn initialize(&self) -> Result<()> {
        self.ensure_base_directory().await?;

        let records = self.load_records().await?;
        let restored = HistoryTable::from_records(records);
        info!(
            "Restored {} records for {} sensors from {}",
            restored.total(),
            restored.sensors().len(),
            self.base_path.display()
        );

        *self.table.write().await = restored;
        Ok(())
    }

    // Mutations are staged and only committed once the document is on disk

    async fn append(&self, reading: Reading) -> Result<RecordId> {
        let mut table = self.table.write().await;
        let mut staged = table.stage(&reading.sensor_key);
        let id = staged.append(reading);
        self.persist(&staged).await?;
        table.commit(staged);
        Ok(id)
    }

    async fn trim(&self, sensor_key: &str) -> Result<Vec<RecordId>> {
        let mut table = self.table.write().await;
        let mut staged = table.stage(sensor_key);
        let evicted = staged.trim(self.max_points);
        if !evicted.is_empty() {
            debug!("Evicted {} records from '{}'", evicted.len(), sensor_key);
            self.persist(&staged).await?;
            table.commit(staged);
        }
        Ok(evicted)
    }

    async fn append_and_trim(&self, reading: Reading) -> Result<RecordId> {
        let mut table = self.table.write().await;
        let mut staged = table.stage(&reading.sensor_key);
        let id = staged.append(reading);
        let evicted = staged.trim(self.max_points);
        if !evicted.is_empty() {
            debug!("Evicted {} records from '{}'", evicted.len(), staged.sensor_key());
        }
        self.persist(&staged).await?;
        table.commit(staged);
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
        match fs::metadata(&self.base_path).await {
            Ok(metadata) if metadata.is_dir() => {
                // Same write path as a sensor document
                let check_path = self.base_path.join(".health_check");
                if let Err(e) = replace_file(&check_path, b"{}").await {
                    warn!("Health check failed - cannot write history: {:#}", e);
                    return Ok(false);
                }
                let _ = fs::remove_file(&check_path).await;
                Ok(true)
            }
            Ok(_) => {
                warn!(
                    "Health check failed - base path is not a directory: {}",
                    self.base_path.display()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    "Health check failed - cannot access base path {}: {}",
                    self.base_path.display(),
                    e
                );
                Ok(false)
            }
        }
    }

    fn max_points(&self) -> usize {
        self.max_points
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
