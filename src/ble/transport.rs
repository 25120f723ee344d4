//! GATT transport abstraction.
//!
//! The interactive session and the catalog builder only talk to a device
//! through [`GattTransport`], so they run the same against btleplug or an
//! in-memory device.

use async_trait::async_trait;
use uuid::Uuid;

use crate::ble::uuids::UuidBase;
use crate::error::Result;

/// A characteristic as reported by service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicNode {
    /// Raw characteristic UUID.
    pub uuid: UuidBase,
}

/// A service as reported by service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode {
    /// Raw service UUID.
    pub uuid: UuidBase,
    /// Characteristics of the service in discovery order.
    pub characteristics: Vec<CharacteristicNode>,
}

/// Read/write access to one connected device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Discovered services in discovery order, GAP and GATT first.
    async fn services(&self) -> Result<Vec<ServiceNode>>;

    /// Read the raw value of a characteristic's user description descriptor.
    async fn read_user_description(&self, characteristic: &Uuid, service: &Uuid)
        -> Result<Vec<u8>>;

    /// Read a characteristic value.
    async fn read_characteristic(&self, characteristic: &Uuid, service: &Uuid) -> Result<Vec<u8>>;

    /// Write a characteristic value, with response.
    async fn write_characteristic(
        &self,
        characteristic: &Uuid,
        service: &Uuid,
        data: &[u8],
    ) -> Result<()>;
}
