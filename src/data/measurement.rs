//! Calibrated measurements carried in SMP290 advertisements.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::ble::uuids::SMP290_COMPANY_ID;
use crate::error::{Error, Result};
use crate::protocol::calibration::{self, PressureRevision};

/// Status trailer appended to longer advertisement payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trailer {
    /// Sensor error status byte.
    pub error_code: u8,
    /// Frame identifier byte.
    pub identifier: u8,
    /// Rolling counter.
    pub counter: u16,
}

/// Physical values decoded from one advertisement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedMeasurement {
    /// Pressure in kPa.
    pub pressure: f64,
    /// Temperature in °C.
    pub temperature: f64,
    /// Z-axis acceleration, low range, in g.
    pub z_acceleration_low: f64,
    /// Z-axis acceleration, high range, in g.
    pub z_acceleration_high: f64,
    /// X-axis acceleration, low range, in g.
    pub x_acceleration_low: f64,
    /// X-axis acceleration, high range, in g.
    pub x_acceleration_high: f64,
    /// Battery voltage in V.
    pub battery_voltage: f64,
    /// Raw measurement tag.
    pub measurement_tag: i16,
    /// Status trailer, present only for payloads longer than the base layout.
    pub trailer: Option<Trailer>,
}

impl DecodedMeasurement {
    /// Size of the payload without trailer, company id included.
    pub const BASE_SIZE: usize = 18;
    /// Smallest payload that carries a trailer.
    pub const TRAILER_MIN_SIZE: usize = 20;
    /// Largest accepted payload.
    pub const MAX_SIZE: usize = 32;

    /// Parse the manufacturer specific data of an SMP290 advertisement.
    ///
    /// Layout (little-endian, signed 16-bit unless noted):
    /// - Bytes 0-1: Company id 0x02A6
    /// - Bytes 2-3: Pressure
    /// - Bytes 4-5: Temperature
    /// - Bytes 6-9: Z acceleration low, high
    /// - Bytes 10-13: X acceleration low, high
    /// - Bytes 14-15: Battery voltage
    /// - Bytes 16-17: Measurement tag
    /// - Byte 18: Error code (optional)
    /// - Byte 19: Identifier (optional)
    /// - Bytes 20-21: Counter, unsigned (optional)
    pub fn parse(data: &[u8], revision: PressureRevision) -> Result<Self> {
        if data.len() < 2 || u16::from_le_bytes([data[0], data[1]]) != SMP290_COMPANY_ID {
            return Err(Error::MalformedAdvertisement {
                context: format!("Not an SMP290 company id: {:02X?}", &data[..data.len().min(2)]),
            });
        }

        let len = data.len();
        if !(Self::BASE_SIZE..=Self::MAX_SIZE).contains(&len)
            || (Self::BASE_SIZE + 1..Self::TRAILER_MIN_SIZE).contains(&len)
        {
            return Err(Error::MalformedAdvertisement {
                context: format!(
                    "Payload of {} bytes (need {}, or {} to {})",
                    len,
                    Self::BASE_SIZE,
                    Self::TRAILER_MIN_SIZE,
                    Self::MAX_SIZE
                ),
            });
        }

        let word = |offset: usize| i32::from(i16::from_le_bytes([data[offset], data[offset + 1]]));

        // Counter bytes past the end of a short trailer read as zero
        let trailer = (len > Self::BASE_SIZE).then(|| Trailer {
            error_code: data[18],
            identifier: data[19],
            counter: u16::from_le_bytes([
                data.get(20).copied().unwrap_or(0),
                data.get(21).copied().unwrap_or(0),
            ]),
        });

        Ok(Self {
            pressure: revision.pressure_kpa(word(2)),
            temperature: calibration::temperature_celsius(word(4)),
            z_acceleration_low: calibration::z_acceleration_low(word(6)),
            z_acceleration_high: calibration::z_acceleration_high(word(8)),
            x_acceleration_low: calibration::x_acceleration_low(word(10)),
            x_acceleration_high: calibration::x_acceleration_high(word(12)),
            battery_voltage: calibration::battery_voltage(i64::from(word(14))),
            measurement_tag: i16::from_le_bytes([data[16], data[17]]),
            trailer,
        })
    }

    /// Decode a payload, returning `None` for anything that is not a valid SMP290 payload.
    pub fn decode(data: &[u8], revision: PressureRevision) -> Option<Self> {
        Self::parse(data, revision).ok()
    }

    /// Human readable summary of the calibrated values.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{:6.2} kPa {:3.0} °C z {:3.1}/{:3.1} g x {:3.1}/{:3.1} g {:1.1} V {}",
            self.pressure,
            self.temperature,
            self.z_acceleration_low,
            self.z_acceleration_high,
            self.x_acceleration_low,
            self.x_acceleration_high,
            self.battery_voltage,
            self.measurement_tag
        );
        if let Some(trailer) = &self.trailer {
            line.push_str(&format!(
                ", error: 0x{:02X}, identifier: {}, counter: {}",
                trailer.error_code, trailer.identifier, trailer.counter
            ));
        }
        line
    }
}

/// One structured data record, formatted as a CSV row by `Display`.
///
/// Rows without a trailer end in a single empty field so every row has at
/// least the same number of columns.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementRecord<'a> {
    /// Reception time.
    pub received_at: DateTime<Utc>,
    /// Formatted device address.
    pub address: &'a str,
    /// Signal strength in dBm.
    pub rssi: i16,
    /// The decoded values.
    pub measurement: &'a DecodedMeasurement,
}

impl std::fmt::Display for MeasurementRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = self.measurement;
        write!(
            f,
            "{},\"{}\",{},{:.2},{:.0},{:.1},{:.1},{:.1},{:.1},{:.1},{}",
            self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.address,
            self.rssi,
            m.pressure,
            m.temperature,
            m.z_acceleration_low,
            m.z_acceleration_high,
            m.x_acceleration_low,
            m.x_acceleration_high,
            m.battery_voltage,
            m.measurement_tag
        )?;
        match &m.trailer {
            Some(trailer) => write!(
                f,
                ",{:02X},{},{}",
                trailer.error_code, trailer.identifier, trailer.counter
            ),
            None => write!(f, ","),
        }
    }
}

#[cfg(test)]
pub(crate) fn build_payload(raw: [i16; 8], trailer: &[u8]) -> Vec<u8> {
    let mut data = SMP290_COMPANY_ID.to_le_bytes().to_vec();
    for value in raw {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data.extend_from_slice(trailer);
    data
}
