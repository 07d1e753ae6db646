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
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use iot_historian::config::{load_config_with_env, ConfigLoader, LoggingConfig};
use iot_historian::{
    build_zenoh_config, BackendFactory, Decoder, IngestPipeline, LatestCache, QueryInterface,
    QueryService, SensorSubscriber,
};

/// IoT Historian - Ingest sensor readings from Zenoh and serve their recent history
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Key expression to subscribe to (overrides config file)
    #[arg(short, long)]
    subscribe: Option<String>,

    /// Log level (overrides config file)
    #[arg(long)]
    log_level: Option<String>,
}

/// Install the global subscriber; RUST_LOG takes precedence over the config level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    match logging.format.as_str() {
        "compact" => tracing::subscriber::set_global_default(builder.compact().finish())?,
        _ => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config_with_env(&args.config)?;

    // Apply CLI overrides
    if let Some(subscribe) = args.subscribe {
        config.ingest.subscribe_key = subscribe;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    ConfigLoader::validate(&config)?;

    init_tracing(&config.logging)?;

    info!("Starting IoT Historian");
    info!("Loaded configuration from: {:?}", args.config);
    info!(
        "Retention: {} points per sensor (untracked bounded: {})",
        config.retention.max_points_per_sensor, config.retention.bound_untracked
    );

    let session = zenoh::open(build_zenoh_config(&config.zenoh)?)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open Zenoh session: {}", e))?;

    info!("Zenoh session opened");

    let store = BackendFactory::create(&config.storage, &config.retention)?;
    store.initialize().await?;
    info!("History backend initialized: {}", store.backend_type());

    if !store.health_check().await? {
        warn!("History backend '{}' reports unhealthy", store.backend_type());
    }

    let cache = Arc::new(LatestCache::new(config.sensors.tracked.iter().cloned()));
    info!("Latest cache slots: {}", cache.tracked_keys().join(", "));

    let pipeline = Arc::new(IngestPipeline::new(
        Decoder::new(config.ingest.payload_fields.clone()),
        cache.clone(),
        store.clone(),
        &config.retention,
    ));

    let (sender, receiver) = mpsc::channel(config.ingest.queue_capacity);
    let worker = tokio::spawn(pipeline.clone().run(receiver));

    let subscriber = SensorSubscriber::new(
        session.clone(),
        config.ingest.subscribe_key.clone(),
        sender,
    );
    let subscriber_task = tokio::spawn(async move {
        if let Err(e) = subscriber.run().await {
            error!("Subscriber error: {}", e);
        }
    });

    let service = Arc::new(QueryService::with_default_points(
        cache,
        store,
        config.api.default_history_points,
    ));
    let query_interface = QueryInterface::new(session.clone(), service, config.api.key_prefix.clone());

    // Serve queries until Ctrl+C
    tokio::select! {
        result = query_interface.run() => {
            if let Err(e) = result {
                error!("Query interface error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    // Dropping the subscriber closes the channel and lets the worker drain it
    subscriber_task.abort();
    let _ = subscriber_task.await;
    if let Err(e) = worker.await {
        error!("Ingest worker panicked: {}", e);
    }

    session
        .close()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to close Zenoh session: {}", e))?;
    info!("IoT Historian shut down successfully");

    Ok(())
}
