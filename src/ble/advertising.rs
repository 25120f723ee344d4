//! Advertising report handling.
//!
//! Describes the advertising reports delivered by the scanner and
//! classifies their advertisement type.

use btleplug::api::BDAddr;

use crate::data::DecodedMeasurement;
use crate::protocol::calibration::PressureRevision;
use crate::utils::format_address;

/// Advertising PDU type from an advertising report.
///
/// Values follow the HCI LE Advertising Report event type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AdvertisementType {
    /// Connectable undirected advertising (ADV_IND).
    #[default]
    ConnectableUndirected = 0,
    /// Connectable directed advertising (ADV_DIRECT_IND).
    ConnectableDirected = 1,
    /// Scannable undirected advertising (ADV_SCAN_IND).
    ScannableUndirected = 2,
    /// Non-connectable undirected advertising (ADV_NONCONN_IND).
    NonConnectableUndirected = 3,
    /// Scan response (SCAN_RSP).
    ScanResponse = 4,
    /// Unknown type.
    Unknown = 0xFF,
}

impl AdvertisementType {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::ConnectableUndirected,
            1 => Self::ConnectableDirected,
            2 => Self::ScannableUndirected,
            3 => Self::NonConnectableUndirected,
            4 => Self::ScanResponse,
            _ => Self::Unknown,
        }
    }

    /// Check if the advertiser accepts connections from any central.
    pub fn is_connectable_undirected(&self) -> bool {
        matches!(self, Self::ConnectableUndirected)
    }

    /// Get the PDU name as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectableUndirected => "ADV_IND",
            Self::ConnectableDirected => "ADV_DIRECT_IND",
            Self::ScannableUndirected => "ADV_SCAN_IND",
            Self::NonConnectableUndirected => "ADV_NONCONN_IND",
            Self::ScanResponse => "SCAN_RSP",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for AdvertisementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One received advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingReport {
    /// Hardware address of the advertiser.
    pub address: BDAddr,
    /// Signal strength in dBm.
    pub rssi: i16,
    /// Advertising PDU type.
    pub advertisement_type: AdvertisementType,
    /// Manufacturer specific data, company id included.
    pub manufacturer_data: Vec<u8>,
}

impl AdvertisingReport {
    /// The advertiser's address as `AA:BB:CC:DD:EE:FF`.
    pub fn address_string(&self) -> String {
        format_address(&self.address)
    }

    /// Decode the manufacturer data with the given pressure calibration.
    pub fn measurement(&self, revision: PressureRevision) -> Option<DecodedMeasurement> {
        DecodedMeasurement::decode(&self.manufacturer_data, revision)
    }
}
