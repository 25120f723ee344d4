//! Error types for the smp290-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The configured pressure characteristic revision is not supported.
    #[error("Unsupported pressure characteristic revision {revision}: expecting either 1 or 2")]
    UnsupportedRevision {
        /// The revision that was requested.
        revision: u8,
    },

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {name} = {value}")]
    Configuration {
        /// The name of the configuration variable.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Manufacturer data that does not belong to an SMP290 sensor, or has the wrong size.
    #[error("Malformed advertisement: {context}")]
    MalformedAdvertisement {
        /// Description of what was wrong with the payload.
        context: String,
    },

    /// The characteristic catalog could not be built.
    #[error("Failed to build characteristic catalog at {characteristic}: {reason}")]
    CatalogBuild {
        /// The characteristic whose user description could not be read.
        characteristic: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The operator asked for a characteristic that is not in the catalog.
    #[error("Unknown characteristic: {name}")]
    UnknownCharacteristic {
        /// The name that was entered.
        name: String,
    },

    /// The operator entered a GPIO pin outside the selectable set.
    #[error("Invalid GPIO pin: {input}")]
    InvalidPinSelection {
        /// The text that was entered.
        input: String,
    },

    /// The operator entered a value that is not a comma-separated byte list.
    #[error("Invalid value: {input}")]
    InvalidValue {
        /// The text that was entered.
        input: String,
    },

    /// No advertising device with the requested address was found.
    #[error("Device not found: {address}")]
    DeviceNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Invalid data was received from the device.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// The characteristic has no user description descriptor.
    #[error("User description not found for characteristic {uuid}")]
    DescriptorNotFound {
        /// The UUID of the characteristic.
        uuid: String,
    },

    /// Operator console I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether an interactive session recovers from this error by returning to idle.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownCharacteristic { .. }
                | Self::InvalidPinSelection { .. }
                | Self::InvalidValue { .. }
                | Self::Bluetooth(_)
                | Self::CharacteristicNotFound { .. }
                | Self::InvalidData { .. }
        )
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_errors_are_recoverable() {
        assert!(Error::UnknownCharacteristic {
            name: "Foo".to_string()
        }
        .is_recoverable());
        assert!(Error::InvalidPinSelection {
            input: "7".to_string()
        }
        .is_recoverable());
        assert!(Error::InvalidValue {
            input: "a,b".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_catalog_errors_are_fatal() {
        let err = Error::CatalogBuild {
            characteristic: "TSD".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(!Error::UnsupportedRevision { revision: 3 }.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedRevision { revision: 3 };
        assert_eq!(
            err.to_string(),
            "Unsupported pressure characteristic revision 3: expecting either 1 or 2"
        );
    }
}
