//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy side of the crate: scanning
//! for SMP290 advertisements and talking GATT to one connected sensor.

pub mod advertising;
pub mod characteristics;
pub mod connection;
pub mod scanner;
pub mod transport;
pub mod uuids;

pub use advertising::{AdvertisementType, AdvertisingReport};
pub use characteristics::{CharacteristicCatalog, CharacteristicEntry};
pub use connection::{BtleplugTransport, ConnectionState};
pub use scanner::BleScanner;
pub use transport::{CharacteristicNode, GattTransport, ServiceNode};
pub use uuids::*;
