//! # dobbyd: dobby daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise `tracing` from the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Pick the device bus: MQTT when enabled, in-process otherwise
//! - Construct and initialise the automation engine
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT), then stop every timer
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use dobby_adapter_http_axum::state::AppState;
use dobby_adapter_mqtt::Zigbee2MqttBus;
use dobby_adapter_storage_sqlite_sqlx::SqliteAutomationStore;
use dobby_app::AutomationEngine;
use dobby_app::clock::SystemClock;
use dobby_app::device_bus::InProcessDeviceBus;
use dobby_app::notifier::LogNotifier;
use dobby_app::ports::DeviceBus;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = dobby_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = db.automation_store();

    // Device bus
    if config.mqtt.enabled {
        tracing::info!(
            host = %config.mqtt.broker_host,
            port = config.mqtt.broker_port,
            "using MQTT device bus"
        );
        serve(&config, store, Zigbee2MqttBus::connect(&config.mqtt)).await
    } else {
        tracing::info!("using in-process device bus");
        serve(&config, store, InProcessDeviceBus::default()).await
    }
}

async fn serve<B>(
    config: &Config,
    store: SqliteAutomationStore,
    bus: B,
) -> Result<(), Box<dyn std::error::Error>>
where
    B: DeviceBus + 'static,
{
    let engine = AutomationEngine::with_config(
        store,
        bus,
        LogNotifier,
        SystemClock,
        config.engine_config(),
    );
    engine.initialize().await;

    // HTTP
    let app = dobby_adapter_http_axum::router::build(AppState::new(engine.clone()));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "dobbyd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown().await;
    tracing::info!("dobbyd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
