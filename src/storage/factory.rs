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

// Backend factory for creating history stores from configuration

use super::backend::HistoryStore;
use super::filesystem::FilesystemHistoryStore;
use super::memory::MemoryHistoryStore;
use crate::config::{RetentionConfig, StorageConfig};
use anyhow::{bail, Result};
use std::sync::Arc;

pub struct BackendFactory;

impl BackendFactory {
    /// Create history store from configuration
    pub fn create(
        config: &StorageConfig,
        retention: &RetentionConfig,
    ) -> Result<Arc<dyn HistoryStore>> {
        let max_points = retention.max_points_per_sensor;

        match config.backend.as_str() {
            "memory" => Ok(Arc::new(MemoryHistoryStore::new(max_points))),

            "filesystem" => {
                let backend_config = config
                    .filesystem
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("Filesystem config missing"))?;

                let backend = FilesystemHistoryStore::new(backend_config.clone(), max_points)?;
                Ok(Arc::new(backend))
            }

            unknown => bail!(
                "Unknown storage backend: '{}'. Supported: memory, filesystem",
                unknown
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilesystemConfig;

    #[test]
    fn test_create_memory_backend() {
        let backend = BackendFactory::create(&StorageConfig::default(), &RetentionConfig::default());
        let backend = backend.unwrap();
        assert_eq!(backend.backend_type(), "memory");
        assert_eq!(backend.max_points(), 600);
    }

    #[test]
    fn test_create_filesystem_backend() {
        let storage_config = StorageConfig {
            backend: "filesystem".to_string(),
            filesystem: Some(FilesystemConfig::default()),
        };
        let retention = RetentionConfig {
            max_points_per_sensor: 50,
            bound_untracked: false,
        };

        let backend = BackendFactory::create(&storage_config, &retention).unwrap();
        assert_eq!(backend.backend_type(), "filesystem");
        assert_eq!(backend.max_points(), 50);
    }

    #[test]
    fn test_create_filesystem_backend_without_section() {
        let storage_config = StorageConfig {
            backend: "filesystem".to_string(),
            filesystem: None,
        };

        let backend = BackendFactory::create(&storage_config, &RetentionConfig::default());
        assert!(backend.is_err());
    }

    #[test]
    fn test_create_unknown_backend() {
        let storage_config = StorageConfig {
            backend: "tinydb".to_string(),
            filesystem: None,
        };

        let backend = BackendFactory::create(&storage_config, &RetentionConfig::default());
        assert!(backend.is_err());
        if let Err(e) = backend {
            assert!(e.to_string().contains("Unknown storage backend"));
        }
    }
}
