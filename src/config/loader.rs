// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<HistorianConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse configuration text (after substitution) and validate it
    pub fn parse(content: &str) -> Result<HistorianConfig> {
        let content = Self::substitute_env_vars(content)?;

        let config: HistorianConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${HISTORIAN_DATA:-/tmp/history} -> /tmp/history (if HISTORIAN_DATA not set)
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}")?;

        let substituted = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Leave the reference untouched when unset and no default
                    None => format!("${{{}}}", var_name),
                },
            }
        });

        Ok(substituted.into_owned())
    }

    /// Validate configuration
    pub fn validate(config: &HistorianConfig) -> Result<()> {
        match config.zenoh.mode.as_str() {
            "peer" | "client" | "router" => {}
            unknown => bail!("zenoh.mode must be peer, client or router (got '{}')", unknown),
        }

        if config.ingest.subscribe_key.trim().is_empty() {
            bail!("ingest.subscribe_key cannot be empty");
        }

        if config.ingest.queue_capacity == 0 {
            bail!("ingest.queue_capacity must be > 0");
        }

        let fields = &config.ingest.payload_fields;
        for (name, value) in [
            ("device_id", &fields.device_id),
            ("timestamp", &fields.timestamp),
            ("value", &fields.value),
            ("unit", &fields.unit),
        ] {
            if value.is_empty() {
                bail!("ingest.payload_fields.{} cannot be empty", name);
            }
        }

        if config.sensors.tracked.is_empty() {
            bail!("sensors.tracked must name at least one sensor");
        }

        let mut seen = HashSet::new();
        for key in &config.sensors.tracked {
            if key.is_empty() || key.contains('/') {
                bail!("sensors.tracked contains an invalid key: '{}'", key);
            }
            if !seen.insert(key) {
                bail!("sensors.tracked lists '{}' more than once", key);
            }
        }

        if config.retention.max_points_per_sensor == 0 {
            bail!("retention.max_points_per_sensor must be > 0");
        }

        match config.storage.backend.as_str() {
            "memory" => {}
            "filesystem" => {
                if config.storage.filesystem.is_none() {
                    bail!("filesystem backend selected but filesystem config missing");
                }
            }
            unknown => bail!("Unknown backend: '{}'. Supported: memory, filesystem", unknown),
        }

        if config.api.key_prefix.trim_matches('/').is_empty() {
            bail!("api.key_prefix cannot be empty");
        }

        if config.api.default_history_points == 0 {
            bail!("api.default_history_points must be > 0");
        }

        match config.logging.format.as_str() {
            "text" | "compact" => {}
            unknown => bail!("logging.format must be text or compact (got '{}')", unknown),
        }

        Ok(())
    }
}
