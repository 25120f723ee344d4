//! Characteristic value decoding.
//!
//! Turns the raw bytes read from a named characteristic into readable lines.
//! Values are transmitted most significant byte first.

use crate::protocol::calibration::{self, PressureRevision};

/// Characteristics the decoder knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    /// Current TX power.
    TxPower,
    /// Counter value.
    Counter,
    /// Thermal shutdown.
    Tsd,
    /// Hardware version string.
    HwVersion,
    /// Firmware version string.
    FwVersion,
    /// Data backup result.
    DataBackup,
    /// Pressure sensor self test result.
    Selftest,
    /// Temperature.
    Temperature,
    /// Temperature, pressure, Z acceleration.
    Tpaz,
    /// Temperature, Z acceleration, X acceleration.
    Tazax,
    /// Battery voltage.
    Vbat,
    /// Selected GPIO pin.
    GpioPin,
    /// GPIO direction and output mode.
    GpioMode,
    /// GPIO drive strength.
    GpioDriveStrength,
    /// GPIO pull resistors.
    GpioPull,
    /// GPIO output value.
    GpioValue,
    /// GPIO input level.
    GpioInputLevel,
}

impl CharacteristicKind {
    /// Every decodable characteristic.
    pub const ALL: [Self; 17] = [
        Self::TxPower,
        Self::Counter,
        Self::Tsd,
        Self::HwVersion,
        Self::FwVersion,
        Self::DataBackup,
        Self::Selftest,
        Self::Temperature,
        Self::Tpaz,
        Self::Tazax,
        Self::Vbat,
        Self::GpioPin,
        Self::GpioMode,
        Self::GpioDriveStrength,
        Self::GpioPull,
        Self::GpioValue,
        Self::GpioInputLevel,
    ];

    /// The user description the device gives this characteristic.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TxPower => "Current TX power",
            Self::Counter => "Counter value",
            Self::Tsd => "TSD",
            Self::HwVersion => "HW Version",
            Self::FwVersion => "FW Version",
            Self::DataBackup => "Data Backup",
            Self::Selftest => "TP Selftest",
            Self::Temperature => "T",
            Self::Tpaz => "TPAZ",
            Self::Tazax => "TAZAX",
            Self::Vbat => "VBAT",
            Self::GpioPin => "GPIO pin",
            Self::GpioMode => "GPIO mode",
            Self::GpioDriveStrength => "GPIO drive strength",
            Self::GpioPull => "GPIO pull resistors",
            Self::GpioValue => "GPIO value",
            Self::GpioInputLevel => "GPIO input level",
        }
    }

    /// Find the kind for a characteristic name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Interpret a raw value.
    pub fn interpret(&self, data: &[u8]) -> Vec<String> {
        match self {
            Self::TxPower => match data.first() {
                Some(&b) => vec![format!("TX power is: {} dBm", b as i8)],
                None => vec![unrecognized("TX power", data)],
            },
            Self::Counter => vec![format!("Counter is: {}", calibration::be_unsigned(data))],
            Self::Tsd => vec![match data {
                [0] => "TSD is disabled".to_string(),
                [1] => "TSD is enabled".to_string(),
                _ => unrecognized("TSD", data),
            }],
            Self::HwVersion => vec![format!("HW Version is: {}", version_string(data))],
            Self::FwVersion => vec![format!("FW Version is: {}", version_string(data))],
            Self::DataBackup => vec![match data {
                [0] => "Data backup succeeded".to_string(),
                [1] => "Data backup failed".to_string(),
                _ => unrecognized("Data backup", data),
            }],
            Self::Selftest => vec![match data {
                [0] => "Selftest succeeded".to_string(),
                _ => format!(
                    "Selftest failed. Error code: 0x{:02x}",
                    calibration::be_unsigned(data)
                ),
            }],
            Self::Temperature => vec![temperature_line(data)],
            Self::Tpaz => vec![
                temperature_line(slice(data, 0)),
                match word(data, 2) {
                    Some(raw) => format!(
                        "Pressure is: {} kPa",
                        PressureRevision::V2.pressure_kpa(raw)
                    ),
                    None => unrecognized("Pressure", slice(data, 2)),
                },
                acceleration_line("Z", slice(data, 4), calibration::z_acceleration_high),
            ],
            Self::Tazax => vec![
                temperature_line(slice(data, 0)),
                acceleration_line("Z", slice(data, 2), calibration::z_acceleration_high),
                acceleration_line("X", slice(data, 4), calibration::x_acceleration_high),
            ],
            Self::Vbat => vec![format!(
                "Battery is: {} V",
                calibration::battery_voltage(calibration::be_unsigned(data) as i64)
            )],
            Self::GpioPin => vec![format!("GPIO pin chosen is: {:?}", data)],
            Self::GpioMode => vec![
                format!(
                    "GPIO direction is: {}",
                    match data.first() {
                        Some(1) => "Input",
                        Some(2) => "Output",
                        _ => "Pin direction disabled",
                    }
                ),
                format!(
                    "GPIO mode is: {}",
                    match data.get(1) {
                        Some(0) => "Push Pull",
                        Some(1) => "Open Drain",
                        _ => "NA",
                    }
                ),
            ],
            Self::GpioDriveStrength => vec![level_line("GPIO drive strength", data)],
            Self::GpioPull => vec![match data.first() {
                Some(0) => "GPIO pull resistor is: None".to_string(),
                Some(1) => "GPIO pull resistor is: Pull Up".to_string(),
                Some(2) => "GPIO pull resistor is: Pull Down".to_string(),
                _ => unrecognized("GPIO pull resistor", data),
            }],
            Self::GpioValue => vec![level_line("GPIO value", data)],
            Self::GpioInputLevel => vec![level_line("GPIO input level", data)],
        }
    }
}

/// Result of decoding a characteristic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// Readable lines describing the value.
    Decoded(Vec<String>),
    /// The characteristic name has no decoder.
    Undecodable,
}

impl Interpretation {
    /// Lines to show to the operator.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Decoded(lines) => lines.clone(),
            Self::Undecodable => vec!["Couldn't decode value".to_string()],
        }
    }
}

/// Decode the value of a named characteristic.
pub fn decode_value(name: &str, data: &[u8]) -> Interpretation {
    match CharacteristicKind::from_name(name) {
        Some(kind) => Interpretation::Decoded(kind.interpret(data)),
        None => Interpretation::Undecodable,
    }
}

/// Two-byte window starting at `offset`, clipped to the data.
fn slice(data: &[u8], offset: usize) -> &[u8] {
    let start = offset.min(data.len());
    let end = (offset + 2).min(data.len());
    &data[start..end]
}

/// Big-endian unsigned 16-bit word at `offset`.
fn word(data: &[u8], offset: usize) -> Option<i32> {
    match slice(data, offset) {
        [hi, lo] => Some(i32::from(u16::from_be_bytes([*hi, *lo]))),
        _ => None,
    }
}

fn temperature_line(data: &[u8]) -> String {
    if data.is_empty() {
        return unrecognized("Temperature", data);
    }
    format!(
        "Temperature is: {} °C",
        calibration::be_unsigned(data)
    )
}

fn acceleration_line(axis: &str, data: &[u8], formula: fn(i32) -> f64) -> String {
    match data {
        [hi, lo] => format!(
            "{} axis acceleration is: {} g",
            axis,
            formula(i32::from(u16::from_be_bytes([*hi, *lo])))
        ),
        _ => unrecognized(&format!("{} axis acceleration", axis), data),
    }
}

fn level_line(label: &str, data: &[u8]) -> String {
    match data.first() {
        Some(0) => format!("{} is: Low", label),
        Some(1) => format!("{} is: High", label),
        _ => unrecognized(label, data),
    }
}

fn version_string(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn unrecognized(label: &str, data: &[u8]) -> String {
    format!("{}: unrecognized value {:?}", label, data)
}
