//! Interactive session with one SMP290
//!
//! Connects to the sensor given as the first argument, or in
//! `SMP290_DEVICE_ADDRESS`, and lets you read and write its characteristics.
//!
//! Run with: cargo run --example interactive_session -- C0:FF:EE:00:01:02

use btleplug::api::BDAddr;
use smp290_ble::ble::scanner::first_adapter;
use smp290_ble::{BtleplugTransport, Config, ConsoleOperator, Error, Result, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smp290_ble=info".parse().unwrap()),
        )
        .init();

    let config = Config::from_env()?;

    let address = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<BDAddr>().map_err(|_| Error::Configuration {
            name: "address".to_string(),
            value: arg.clone(),
        })?,
        None => config.device_address.ok_or_else(|| Error::Configuration {
            name: "SMP290_DEVICE_ADDRESS".to_string(),
            value: String::new(),
        })?,
    };

    let adapter = first_adapter().await?;

    println!("Connecting to {}...", address);
    let transport = BtleplugTransport::connect(&adapter, address, config.connect_timeout).await?;

    let mut session = Session::new(transport, ConsoleOperator::new());
    let result = session.run().await;

    session.transport().disconnect().await?;
    result
}
