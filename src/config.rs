//! Runtime configuration from the environment.
//!
//! Variables are read from the process environment, after loading an
//! optional `.env` file.

use btleplug::api::BDAddr;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::calibration::PressureRevision;

/// Pressure characteristic revision, `1` or `2`.
pub const PRESSURE_REVISION_VAR: &str = "SMP290_PRESSURE_REVISION";
/// Scan duration in seconds.
pub const SCAN_SECONDS_VAR: &str = "SMP290_SCAN_SECONDS";
/// Path of the data record file.
pub const DATA_LOG_VAR: &str = "SMP290_DATA_LOG";
/// Address of the device for interactive sessions.
pub const DEVICE_ADDRESS_VAR: &str = "SMP290_DEVICE_ADDRESS";
/// How long to look for the device before giving up, in seconds.
pub const CONNECT_TIMEOUT_VAR: &str = "SMP290_CONNECT_TIMEOUT_SECONDS";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Calibration used to decode pressure.
    pub pressure_revision: PressureRevision,
    /// How long a scan runs.
    pub scan_duration: Duration,
    /// Where data records are written.
    pub data_log: PathBuf,
    /// Device to connect to.
    pub device_address: Option<BDAddr>,
    /// How long to look for the device.
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pressure_revision: PressureRevision::V2,
            scan_duration: Duration::from_secs(30),
            data_log: PathBuf::from("measurements.csv"),
            device_address: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load the configuration from the environment and `.env`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRevision`] for a revision other than 1 or
    /// 2 and [`Error::Configuration`] for any other malformed value.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let pressure_revision = match parse_var::<u8>(&lookup, PRESSURE_REVISION_VAR)? {
            Some(revision) => PressureRevision::try_from(revision)?,
            None => defaults.pressure_revision,
        };

        let scan_duration = parse_var::<u64>(&lookup, SCAN_SECONDS_VAR)?
            .map_or(defaults.scan_duration, Duration::from_secs);

        let data_log = lookup(DATA_LOG_VAR)
            .filter(|path| !path.trim().is_empty())
            .map_or(defaults.data_log, PathBuf::from);

        let device_address = parse_var::<BDAddr>(&lookup, DEVICE_ADDRESS_VAR)?;

        let connect_timeout = parse_var::<u64>(&lookup, CONNECT_TIMEOUT_VAR)?
            .map_or(defaults.connect_timeout, Duration::from_secs);

        let config = Self {
            pressure_revision,
            scan_duration,
            data_log,
            device_address,
            connect_timeout,
        };
        debug!("Configuration: {:?}", config);

        Ok(config)
    }
}

/// Parse an optional variable; empty values count as unset.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::Configuration {
                    name: name.to_string(),
                    value,
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_all_variables() {
        let config = load(&[
            (PRESSURE_REVISION_VAR, "1"),
            (SCAN_SECONDS_VAR, "5"),
            (DATA_LOG_VAR, "/tmp/tpms.csv"),
            (DEVICE_ADDRESS_VAR, "C0:FF:EE:00:01:02"),
            (CONNECT_TIMEOUT_VAR, " 3 "),
        ])
        .unwrap();

        assert_eq!(config.pressure_revision, PressureRevision::V1);
        assert_eq!(config.scan_duration, Duration::from_secs(5));
        assert_eq!(config.data_log, PathBuf::from("/tmp/tpms.csv"));
        assert_eq!(
            config.device_address,
            Some(BDAddr::from([0xC0, 0xFF, 0xEE, 0x00, 0x01, 0x02]))
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_unsupported_revision() {
        assert!(matches!(
            load(&[(PRESSURE_REVISION_VAR, "3")]),
            Err(Error::UnsupportedRevision { revision: 3 })
        ));
    }

    #[test]
    fn test_malformed_values() {
        assert!(matches!(
            load(&[(SCAN_SECONDS_VAR, "soon")]),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            load(&[(DEVICE_ADDRESS_VAR, "not-an-address")]),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = load(&[(SCAN_SECONDS_VAR, ""), (DATA_LOG_VAR, "  ")]).unwrap();
        assert_eq!(config, Config::default());
    }
}
