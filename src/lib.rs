// Allow holding locks across await points - we use parking_lot which is designed for this
#![allow(clippy::await_holding_lock)]
// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # smp290-ble
//!
//! A cross-platform Rust library for the Bosch SMP290 tyre pressure sensor
//! over Bluetooth Low Energy.
//!
//! The crate works in two modes:
//!
//! - **Scan mode**: decode the pressure, temperature, acceleration and
//!   battery readings every SMP290 broadcasts in its advertisements, and
//!   emit one structured data record per advertisement.
//! - **Connected mode**: connect to one sensor, discover its characteristics
//!   by their user descriptions and read, write and decode them in an
//!   interactive session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smp290_ble::{Config, DeviceManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let manager = DeviceManager::new(config.pressure_revision).await?;
//!     let mut measurements = manager.subscribe();
//!     manager.start_scanning().await?;
//!
//!     while let Ok(event) = measurements.recv().await {
//!         println!("{}: {:.2} kPa", event.address, event.measurement.pressure);
//!     }
//!
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Data records
//!
//! Decoded advertisements are logged with `tracing` on the
//! [`DATA_LOG_TARGET`] target as CSV rows, so a subscriber can route them to
//! their own file.
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod device_manager;
pub mod error;
pub mod protocol;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::Config;
pub use device_manager::{
    process_report, DeviceManager, DeviceRegistry, MeasurementEvent, DATA_LOG_TARGET,
};
pub use error::{Error, Result};
pub use session::{ConsoleOperator, Operator, Session, SessionState};
pub use utils::{format_address, parse_byte_list};

// Re-export commonly used types from submodules
pub use ble::advertising::{AdvertisementType, AdvertisingReport};
pub use ble::characteristics::{CharacteristicCatalog, CharacteristicEntry};
pub use ble::connection::BtleplugTransport;
pub use ble::transport::GattTransport;
pub use data::{DecodedMeasurement, MeasurementRecord, Trailer};
pub use protocol::{decode_value, PressureRevision};
