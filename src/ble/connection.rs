//! btleplug GATT transport.
//!
//! Connects to one SMP290 by address and gives the interactive session
//! access to its characteristics.

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Peripheral as _, ScanFilter, Service, WriteType,
};
use btleplug::platform::{Adapter, Peripheral};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ble::transport::{CharacteristicNode, GattTransport, ServiceNode};
use crate::ble::uuids::{UuidBase, GAP_SERVICE_UUID, GATT_SERVICE_UUID, USER_DESCRIPTION_UUID};
use crate::error::{Error, Result};
use crate::utils::format_address;

/// Interval between peripheral list polls while looking for the device.
const DISCOVERY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Connection state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Connected with services discovered.
    Connected,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// [`GattTransport`] over a btleplug peripheral.
pub struct BtleplugTransport {
    peripheral: Peripheral,
    address: BDAddr,
    state: RwLock<ConnectionState>,
}

impl BtleplugTransport {
    /// Scan for a device and connect to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the device is not seen within
    /// `timeout`, or [`Error::ConnectionFailed`] if connecting or service
    /// discovery fails.
    pub async fn connect(adapter: &Adapter, address: BDAddr, timeout: Duration) -> Result<Self> {
        let address_string = format_address(&address);
        info!("Looking for {}", address_string);

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let found = tokio::time::timeout(timeout, find_peripheral(adapter, address)).await;

        if let Err(e) = adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        let peripheral = match found {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::DeviceNotFound {
                    address: address_string,
                })
            }
        };

        let transport = Self {
            peripheral,
            address,
            state: RwLock::new(ConnectionState::Disconnected),
        };
        transport.establish().await?;

        Ok(transport)
    }

    async fn establish(&self) -> Result<()> {
        let address = format_address(&self.address);

        if !self.peripheral.is_connected().await.unwrap_or(false) {
            self.peripheral
                .connect()
                .await
                .map_err(|e| Error::ConnectionFailed {
                    reason: format!("{}: {}", address, e),
                })?;
        }
        info!("Connected to {}", address);

        self.peripheral
            .discover_services()
            .await
            .map_err(|e| Error::ConnectionFailed {
                reason: format!("service discovery on {}: {}", address, e),
            })?;
        debug!("Discovered {} services", self.peripheral.services().len());

        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        if !self.state().is_connected() {
            return Ok(());
        }

        let result = self.peripheral.disconnect().await;
        self.set_state(ConnectionState::Disconnected);

        match result {
            Ok(()) => {
                info!("Disconnected from {}", format_address(&self.address));
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Address of the connected device.
    pub fn address(&self) -> BDAddr {
        self.address
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);
        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }

    fn characteristic(&self, characteristic: &Uuid, service: &Uuid) -> Result<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == *characteristic && c.service_uuid == *service)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            })
    }
}

async fn find_peripheral(adapter: &Adapter, address: BDAddr) -> Result<Peripheral> {
    loop {
        for peripheral in adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if peripheral.address() == address {
                return Ok(peripheral);
            }
        }
        tokio::time::sleep(DISCOVERY_POLL_INTERVAL).await;
    }
}

fn service_node(service: &Service) -> ServiceNode {
    ServiceNode {
        uuid: UuidBase::from(service.uuid),
        characteristics: service
            .characteristics
            .iter()
            .map(|c| CharacteristicNode {
                uuid: UuidBase::from(c.uuid),
            })
            .collect(),
    }
}

/// Put GAP and GATT in the first two slots, keeping the order of the rest.
///
/// Some platforms do not report the mandatory services; an empty service
/// stands in for a missing one.
pub fn order_services(services: Vec<ServiceNode>) -> Vec<ServiceNode> {
    let gap = UuidBase::from(GAP_SERVICE_UUID);
    let gatt = UuidBase::from(GATT_SERVICE_UUID);

    let mut ordered = Vec::with_capacity(services.len() + 2);
    for mandatory in [&gap, &gatt] {
        let node = services
            .iter()
            .find(|s| s.uuid == *mandatory)
            .cloned()
            .unwrap_or_else(|| ServiceNode {
                uuid: mandatory.clone(),
                characteristics: Vec::new(),
            });
        ordered.push(node);
    }
    ordered.extend(
        services
            .into_iter()
            .filter(|s| s.uuid != gap && s.uuid != gatt),
    );
    ordered
}

#[async_trait]
impl GattTransport for BtleplugTransport {
    async fn services(&self) -> Result<Vec<ServiceNode>> {
        let nodes = self.peripheral.services().iter().map(service_node).collect();
        Ok(order_services(nodes))
    }

    async fn read_user_description(&self, characteristic: &Uuid, service: &Uuid) -> Result<Vec<u8>> {
        let target = self.characteristic(characteristic, service)?;
        let descriptor = target
            .descriptors
            .iter()
            .find(|d| d.uuid == USER_DESCRIPTION_UUID)
            .ok_or_else(|| Error::DescriptorNotFound {
                uuid: characteristic.to_string(),
            })?;

        Ok(self.peripheral.read_descriptor(descriptor).await?)
    }

    async fn read_characteristic(&self, characteristic: &Uuid, service: &Uuid) -> Result<Vec<u8>> {
        let target = self.characteristic(characteristic, service)?;
        let data = self.peripheral.read(&target).await?;
        debug!("Read {} bytes from {}", data.len(), characteristic);
        Ok(data)
    }

    async fn write_characteristic(
        &self,
        characteristic: &Uuid,
        service: &Uuid,
        data: &[u8],
    ) -> Result<()> {
        let target = self.characteristic(characteristic, service)?;
        debug!("Writing {:?} to {}", data, characteristic);
        self.peripheral
            .write(&target, data, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::{CUSTOM_SERVICE_UUID, GPIO_SERVICE_UUID, TSD_UUID};
    use pretty_assertions::assert_eq;

    fn node(uuid: Uuid) -> ServiceNode {
        ServiceNode {
            uuid: UuidBase::from(uuid),
            characteristics: Vec::new(),
        }
    }

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
    }

    #[test]
    fn test_order_services_moves_mandatory_first() {
        let mut custom = node(CUSTOM_SERVICE_UUID);
        custom.characteristics.push(CharacteristicNode {
            uuid: UuidBase::from(TSD_UUID),
        });

        let ordered = order_services(vec![
            custom.clone(),
            node(GATT_SERVICE_UUID),
            node(GPIO_SERVICE_UUID),
            node(GAP_SERVICE_UUID),
        ]);

        assert_eq!(
            ordered,
            vec![
                node(GAP_SERVICE_UUID),
                node(GATT_SERVICE_UUID),
                custom,
                node(GPIO_SERVICE_UUID),
            ]
        );
    }

    #[test]
    fn test_order_services_fills_hidden_mandatory() {
        let ordered = order_services(vec![node(GPIO_SERVICE_UUID)]);

        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0], node(GAP_SERVICE_UUID));
        assert_eq!(ordered[1], node(GATT_SERVICE_UUID));
        assert_eq!(ordered[2], node(GPIO_SERVICE_UUID));
    }
}
