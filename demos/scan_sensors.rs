//! Scan for SMP290 sensors and log their measurements
//!
//! Readable log lines go to stderr, data records to the file named by
//! `SMP290_DATA_LOG`.
//!
//! Run with: cargo run --example scan_sensors

use smp290_ble::{Config, DeviceManager, Result, DATA_LOG_TARGET};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let data_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.data_log)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::from_default_env()
                        .add_directive("smp290_ble=debug".parse().unwrap())
                        .add_directive(format!("{}=off", DATA_LOG_TARGET).parse().unwrap()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(data_file))
                .with_ansi(false)
                .without_time()
                .with_level(false)
                .with_target(false)
                .with_filter(filter_fn(|meta| meta.target() == DATA_LOG_TARGET)),
        )
        .init();

    println!("Starting SMP290 scan ({})...", config.pressure_revision);
    println!("Writing data records to {}\n", config.data_log.display());

    let manager = DeviceManager::new(config.pressure_revision).await?;
    let mut measurements = manager.subscribe();

    manager.start_scanning().await?;

    println!("Scanning for {} seconds...", config.scan_duration.as_secs());
    println!("Press Ctrl+C to exit early.\n");

    let deadline = tokio::time::sleep(config.scan_duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted!");
                break;
            }
            Ok(event) = measurements.recv() => {
                println!(
                    "{} {} dBm: {}",
                    event.address,
                    event.rssi,
                    event.measurement.summary()
                );
            }
        }
    }

    println!("\n--- Scan Complete ---");
    let registry = manager.registry();
    println!("Total sensors seen: {}", registry.known_count());

    let mut connectable: Vec<_> = registry.connectable_devices().into_keys().collect();
    connectable.sort();
    for address in connectable {
        println!("  {} (connectable)", address);
    }

    manager.shutdown().await?;
    println!("\nDone!");

    Ok(())
}
