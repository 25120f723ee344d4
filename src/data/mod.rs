//! Data structures for sensor data.
//!
//! This module contains the measurement types decoded from advertisements
//! and the structured records emitted for them.

pub mod measurement;

pub use measurement::{DecodedMeasurement, MeasurementRecord, Trailer};
