// Configuration system integration tests

use iot_historian::config::{
    apply_env_overrides, load_config, ConfigLoader, HistorianConfig,
};
use iot_historian::MAX_POINTS_PER_SENSOR;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_default_config() {
    let config_path = PathBuf::from("config/default.yaml");

    if config_path.exists() {
        let result = load_config(&config_path);
        assert!(result.is_ok(), "Failed to load default config: {:?}", result.err());

        let config = result.unwrap();

        assert_eq!(config.zenoh.mode, "peer");
        assert_eq!(config.ingest.subscribe_key, "iot/czujnik/**");
        assert_eq!(config.sensors.tracked.len(), 5);
        assert_eq!(config.retention.max_points_per_sensor, 600);
        assert!(!config.retention.bound_untracked);
        assert_eq!(config.storage.backend, "filesystem");
        assert_eq!(config.api.default_history_points, 120);
        assert_eq!(config.logging.level, "info");
    }
}

#[test]
fn test_config_with_env_vars() {
    let temp_config = r#"
zenoh:
  mode: client
  connect:
    endpoints:
      - ${CFG_TEST_ENDPOINT:-tcp/10.0.0.1:7447}

ingest:
  subscribe_key: ${CFG_TEST_SUBSCRIBE:-sensors/**}

storage:
  backend: filesystem
  filesystem:
    base_path: ${CFG_TEST_PATH}

logging:
  level: debug
"#;

    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path().join("historian.yaml");
    fs::write(&temp_path, temp_config).expect("Failed to write temp config");

    std::env::set_var("CFG_TEST_PATH", "/srv/history");
    std::env::remove_var("CFG_TEST_SUBSCRIBE");

    let result = load_config(&temp_path);
    assert!(result.is_ok(), "Failed to load config with env vars: {:?}", result.err());

    let config = result.unwrap();

    assert_eq!(
        config.zenoh.connect.as_ref().unwrap().endpoints,
        vec!["tcp/10.0.0.1:7447".to_string()]
    );
    assert_eq!(config.ingest.subscribe_key, "sensors/**");
    assert_eq!(config.storage.filesystem.as_ref().unwrap().base_path, "/srv/history");
    assert_eq!(config.logging.level, "debug");

    // Sections left out fall back to defaults
    assert_eq!(config.sensors.tracked[0], "temperatura");
    assert_eq!(config.retention.max_points_per_sensor, 600);
    assert_eq!(config.api.key_prefix, "iot/api");

    std::env::remove_var("CFG_TEST_PATH");
}

#[test]
fn test_minimal_config() {
    let config = ConfigLoader::parse("{}").unwrap();
    assert_eq!(config.storage.backend, "memory");
    assert_eq!(config.retention.max_points_per_sensor, MAX_POINTS_PER_SENSOR);
    assert_eq!(config.ingest.payload_fields.timestamp, "czas");
}

#[test]
fn test_invalid_config_rejected() {
    let invalid = r#"
retention:
  max_points_per_sensor: 0
"#;
    let result = ConfigLoader::parse(invalid);
    assert!(result.is_err());

    let invalid_yaml = "zenoh: [unclosed";
    assert!(ConfigLoader::parse(invalid_yaml).is_err());

    let unknown_backend = r#"
storage:
  backend: tinydb
"#;
    let result = ConfigLoader::parse(unknown_backend);
    assert!(result.unwrap_err().to_string().contains("Unknown backend"));
}

#[test]
fn test_missing_config_file() {
    assert!(load_config("/nonexistent/historian.yaml").is_err());
}

#[test]
fn test_env_overrides() {
    std::env::set_var("HISTORIAN_SUBSCRIBE_KEY", "lab/sensors/**");
    std::env::set_var("HISTORIAN_STORAGE_PATH", "/tmp/historian-override");

    let mut config = HistorianConfig::default();
    apply_env_overrides(&mut config).unwrap();

    assert_eq!(config.ingest.subscribe_key, "lab/sensors/**");
    assert_eq!(
        config.storage.filesystem.as_ref().unwrap().base_path,
        "/tmp/historian-override"
    );

    std::env::remove_var("HISTORIAN_SUBSCRIBE_KEY");
    std::env::remove_var("HISTORIAN_STORAGE_PATH");
}

#[test]
fn test_config_round_trips_through_yaml() {
    let config = HistorianConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed = ConfigLoader::parse(&yaml).unwrap();
    assert_eq!(parsed.sensors.tracked, config.sensors.tracked);
    assert_eq!(parsed.ingest.payload_fields, config.ingest.payload_fields);
}
