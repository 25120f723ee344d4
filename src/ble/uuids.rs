//! BLE Service and Characteristic UUIDs.
//!
//! Contains the UUID constants of the SMP290 firmware and the conversion
//! from the raw UUID bases reported by service discovery.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Bosch's Bluetooth company identifier, prefixed to the manufacturer data.
pub const SMP290_COMPANY_ID: u16 = 0x02A6;

/// Bluetooth SIG base UUID that 16-bit UUIDs are embedded into.
pub const BLUETOOTH_BASE_UUID: Uuid = Uuid::from_u128(0x0000_0000_0000_1000_8000_00805f9b34fb);

// Mandatory services (Standard BLE)
/// Generic Access Profile service UUID.
pub const GAP_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1800_0000_1000_8000_00805f9b34fb);
/// Generic Attribute Profile service UUID.
pub const GATT_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1801_0000_1000_8000_00805f9b34fb);
/// Characteristic User Description descriptor UUID.
pub const USER_DESCRIPTION_UUID: Uuid = Uuid::from_u128(0x0000_2901_0000_1000_8000_00805f9b34fb);

/// Number of mandatory services that precede the custom ones in discovery order.
pub const MANDATORY_SERVICE_COUNT: usize = 2;

// Custom Service
/// Custom service UUID (TX power, counter, thermal shutdown).
pub const CUSTOM_SERVICE_UUID: Uuid = Uuid::from_u128(0x02a6_3290_1a00_b83e_af18_025703723367);
/// Current TX power characteristic UUID.
pub const TX_POWER_UUID: Uuid = Uuid::from_u128(0x02a6_3290_1a01_b83e_af18_025703723367);
/// Counter value characteristic UUID.
pub const COUNTER_UUID: Uuid = Uuid::from_u128(0x02a6_3290_1a02_b83e_af18_025703723367);
/// Thermal shutdown characteristic UUID.
pub const TSD_UUID: Uuid = Uuid::from_u128(0x02a6_3290_1a03_b83e_af18_025703723367);

// GPIO Service
/// GPIO service UUID.
pub const GPIO_SERVICE_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b00_11f0_8de9_0242ac120002);
/// GPIO value characteristic UUID.
pub const GPIO_VALUE_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b03_11f0_8de9_0242ac120002);
/// GPIO mode characteristic UUID.
pub const GPIO_MODE_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b12_11f0_8de9_0242ac120002);
/// GPIO drive strength characteristic UUID.
pub const GPIO_DRIVE_STRENGTH_UUID: Uuid =
    Uuid::from_u128(0x5de2_3c6e_1b13_11f0_8de9_0242ac120002);
/// GPIO pull resistors characteristic UUID.
pub const GPIO_PULL_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b14_11f0_8de9_0242ac120002);
/// GPIO input level characteristic UUID.
pub const GPIO_INPUT_LEVEL_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b15_11f0_8de9_0242ac120002);
/// GPIO pin selector characteristic UUID.
pub const GPIO_PIN_UUID: Uuid = Uuid::from_u128(0x5de2_3c6e_1b16_11f0_8de9_0242ac120002);

// Maintenance Service
/// Maintenance service UUID.
pub const MAINTENANCE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0fd4_d14e_1c00_11f0_8de9_0242ac120002);
/// HW Version characteristic UUID.
pub const HW_VERSION_UUID: Uuid = Uuid::from_u128(0x0fd4_d14e_1c21_11f0_8de9_0242ac120002);
/// FW Version characteristic UUID.
pub const FW_VERSION_UUID: Uuid = Uuid::from_u128(0x0fd4_d14e_1c22_11f0_8de9_0242ac120002);
/// Data Backup characteristic UUID.
pub const DATA_BACKUP_UUID: Uuid = Uuid::from_u128(0x0fd4_d14e_1c23_11f0_8de9_0242ac120002);
/// TP Selftest characteristic UUID.
pub const TP_SELFTEST_UUID: Uuid = Uuid::from_u128(0x0fd4_d14e_1c24_11f0_8de9_0242ac120002);

// Measurement Service
/// Measurement service UUID.
pub const MEASUREMENT_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x3bda_c86d_1d00_4876_8b9d_f5799cfa02ba);
/// T characteristic UUID.
pub const T_UUID: Uuid = Uuid::from_u128(0x3bda_c86d_1d31_4876_8b9d_f5799cfa02ba);
/// TPAZ characteristic UUID.
pub const TPAZ_UUID: Uuid = Uuid::from_u128(0x3bda_c86d_1d32_4876_8b9d_f5799cfa02ba);
/// TAZAX characteristic UUID.
pub const TAZAX_UUID: Uuid = Uuid::from_u128(0x3bda_c86d_1d33_4876_8b9d_f5799cfa02ba);
/// VBAT characteristic UUID.
pub const VBAT_UUID: Uuid = Uuid::from_u128(0x3bda_c86d_1d34_4876_8b9d_f5799cfa02ba);

/// Check if a service UUID is one of the SMP290 custom services.
pub fn is_smp290_service(uuid: &Uuid) -> bool {
    [
        CUSTOM_SERVICE_UUID,
        GPIO_SERVICE_UUID,
        MAINTENANCE_SERVICE_UUID,
        MEASUREMENT_SERVICE_UUID,
    ]
    .contains(uuid)
}

/// Kind of a raw UUID as reported by service discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidType {
    /// 16-bit UUID assigned by the Bluetooth SIG.
    Sig16,
    /// 128-bit vendor specific UUID.
    VendorSpecific,
}

/// A UUID in the raw form reported by service discovery.
///
/// `bytes` holds the UUID value most significant byte first: two bytes for a
/// [`UuidType::Sig16`] UUID, sixteen for a vendor specific one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UuidBase {
    /// Raw UUID value bytes.
    pub bytes: Vec<u8>,
    /// The UUID type tag.
    pub kind: UuidType,
}

impl UuidBase {
    /// Create a UUID base from raw bytes and a type tag.
    pub fn new(bytes: impl Into<Vec<u8>>, kind: UuidType) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
        }
    }

    /// Reconstruct the full UUID.
    ///
    /// The bytes are read as one big-endian 128-bit integer which is then
    /// placed according to the type tag.
    pub fn to_uuid(&self) -> Result<Uuid> {
        let expected = match self.kind {
            UuidType::Sig16 => 2,
            UuidType::VendorSpecific => 16,
        };
        if self.bytes.len() != expected {
            return Err(Error::InvalidData {
                context: format!(
                    "UUID base of type {:?} has {} bytes (need {})",
                    self.kind,
                    self.bytes.len(),
                    expected
                ),
            });
        }

        let value = self
            .bytes
            .iter()
            .fold(0u128, |acc, &byte| (acc << 8) | u128::from(byte));

        Ok(match self.kind {
            UuidType::Sig16 => Uuid::from_u128(BLUETOOTH_BASE_UUID.as_u128() | (value << 96)),
            UuidType::VendorSpecific => Uuid::from_u128(value),
        })
    }
}

impl From<Uuid> for UuidBase {
    fn from(uuid: Uuid) -> Self {
        let value = uuid.as_u128();
        if value & !(0xFFFF_u128 << 96) == BLUETOOTH_BASE_UUID.as_u128() {
            let short = (value >> 96) as u16;
            Self::new(short.to_be_bytes(), UuidType::Sig16)
        } else {
            Self::new(*uuid.as_bytes(), UuidType::VendorSpecific)
        }
    }
}
