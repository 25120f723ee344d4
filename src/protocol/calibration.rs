//! Calibration formulas.
//!
//! Converts raw sensor codes into physical units. Both the advertisement
//! decoder and the GATT value decoder go through these functions.

use crate::error::{Error, Result};

/// Pressure characteristic revision of the sensor's calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PressureRevision {
    /// Lower clipping at 100 kPa.
    V1,
    /// Lower clipping at 90 kPa.
    #[default]
    V2,
}

impl PressureRevision {
    /// Revision number as configured.
    pub fn number(&self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Convert a raw pressure code to kPa.
    pub fn pressure_kpa(&self, raw: i32) -> f64 {
        match self {
            Self::V1 => 0.40059 * f64::from(raw) + 100.0,
            Self::V2 => 0.40547 * f64::from(raw) + 90.0,
        }
    }
}

impl TryFrom<u8> for PressureRevision {
    type Error = Error;

    fn try_from(revision: u8) -> Result<Self> {
        match revision {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            _ => Err(Error::UnsupportedRevision { revision }),
        }
    }
}

impl std::fmt::Display for PressureRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "revision {}", self.number())
    }
}

/// Temperature in °C (one code per degree).
#[inline]
pub fn temperature_celsius(raw: i32) -> f64 {
    f64::from(raw)
}

/// Z-axis acceleration in g, low range.
#[inline]
pub fn z_acceleration_low(raw: i32) -> f64 {
    640.0 / 2048.0 * f64::from(raw)
}

/// Z-axis acceleration in g, high range.
#[inline]
pub fn z_acceleration_high(raw: i32) -> f64 {
    1920.0 / 2048.0 * f64::from(raw)
}

/// X-axis acceleration in g, low range.
#[inline]
pub fn x_acceleration_low(raw: i32) -> f64 {
    220.0 / 2048.0 * f64::from(raw)
}

/// X-axis acceleration in g, high range.
#[inline]
pub fn x_acceleration_high(raw: i32) -> f64 {
    660.0 / 2048.0 * f64::from(raw)
}

/// Battery voltage in V.
#[inline]
pub fn battery_voltage(raw: i64) -> f64 {
    0.005 * raw as f64 + 1.9
}

/// Interpret a byte slice as one big-endian unsigned integer.
///
/// GATT characteristic values are transmitted most significant byte first.
/// Bytes beyond the width of `u64` shift the leading ones out.
pub fn be_unsigned(data: &[u8]) -> u64 {
    data.iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pressure_offsets() {
        assert_eq!(PressureRevision::V1.pressure_kpa(0), 100.0);
        assert_eq!(PressureRevision::V2.pressure_kpa(0), 90.0);
        assert!((PressureRevision::V2.pressure_kpa(100) - 130.547).abs() < 1e-9);
        assert!((PressureRevision::V1.pressure_kpa(100) - 140.059).abs() < 1e-9);
    }

    #[test]
    fn test_revision_from_number() {
        assert_eq!(PressureRevision::try_from(1).unwrap(), PressureRevision::V1);
        assert_eq!(PressureRevision::try_from(2).unwrap(), PressureRevision::V2);
        assert!(matches!(
            PressureRevision::try_from(3),
            Err(Error::UnsupportedRevision { revision: 3 })
        ));
        assert!(PressureRevision::try_from(0).is_err());
    }

    #[test]
    fn test_acceleration_scales() {
        assert_eq!(z_acceleration_low(2048), 640.0);
        assert_eq!(z_acceleration_high(2048), 1920.0);
        assert_eq!(x_acceleration_low(2048), 220.0);
        assert_eq!(x_acceleration_high(-2048), -660.0);
    }

    #[test]
    fn test_battery_voltage() {
        assert!((battery_voltage(0) - 1.9).abs() < 1e-12);
        assert!((battery_voltage(200) - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_be_unsigned() {
        assert_eq!(be_unsigned(&[]), 0);
        assert_eq!(be_unsigned(&[0x01, 0x00]), 256);
        assert_eq!(be_unsigned(&[0x00, 0x00, 0x01, 0x2C]), 300);
    }

    proptest! {
        #[test]
        fn pressure_is_strictly_increasing(a in any::<i16>(), b in any::<i16>()) {
            prop_assume!(a < b);
            for revision in [PressureRevision::V1, PressureRevision::V2] {
                prop_assert!(
                    revision.pressure_kpa(i32::from(a)) < revision.pressure_kpa(i32::from(b))
                );
            }
        }
    }
}
