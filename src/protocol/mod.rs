//! Protocol module for interpreting sensor values.
//!
//! This module contains the implementations for:
//! - Calibration of raw sensor codes
//! - Decoding of characteristic values read over GATT

pub mod calibration;
pub mod values;

pub use calibration::PressureRevision;
pub use values::{decode_value, CharacteristicKind, Interpretation};
