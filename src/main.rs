//! ==============================================================================
//! main.rs - sensor simulator entry point
//! ==============================================================================
//!
//! purpose:
//!     pretends to be a handful of environmental sensors so a data-collection
//!     backend can be exercised without hardware. every cycle one sensor
//!     reports a synthetic temperature/humidity reading over HTTP.
//!
//! responsibilities:
//!     - load configuration (toml file, then SENSOR_SIM_* overrides)
//!     - initialize logging
//!     - run the send loop until ctrl-c
//!
//! relationships:
//!     - uses: config.rs (settings), simulator.rs (the loop)
//!     - simulator.rs uses: domain.rs (readings), transmit.rs (http push)
//!
//! usage:
//!     sensor-sim [path/to/sensor-sim.toml]
//!
//! ==============================================================================

mod config;
mod domain;
mod simulator;
mod transmit;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Sensor Data Simulator");
    println!("===========================================================");

    // step 1: load configuration
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let mut config = config::SimConfig::load_or_default(explicit)?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    config.validate()?;
    config.print_summary();

    // step 2: logging, RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // step 3: build the simulator
    let mut simulator = simulator::Simulator::from_config(&config)?;

    // step 4: ctrl-c ends the loop after the current send
    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                signal.notify_one();
            }
            Err(e) => tracing::error!("failed to listen for ctrl-c: {}", e),
        }
    });

    // step 5: main send loop
    tracing::info!(
        endpoint = %config.api.endpoint,
        "Starting sensor data simulator. Sending data every {} seconds to {}",
        config.schedule.interval_seconds,
        config.api.endpoint
    );
    tracing::info!("Simulating {} sensors cycling through.", config.sensors.count);

    simulator.run_until(async move { shutdown.notified().await }).await;
    Ok(())
}
