//! Characteristic catalog.
//!
//! Maps the human readable names found in user description descriptors to
//! the characteristic and service UUIDs needed to read or write them.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::transport::GattTransport;
use crate::ble::uuids::MANDATORY_SERVICE_COUNT;
use crate::error::{Error, Result};

/// A named characteristic of the connected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicEntry {
    /// Characteristic UUID.
    pub characteristic: Uuid,
    /// UUID of the owning service.
    pub service: Uuid,
}

/// Name to characteristic mapping for one connected session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicCatalog {
    entries: BTreeMap<String, CharacteristicEntry>,
}

impl CharacteristicCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog by reading every custom characteristic's user description.
    ///
    /// The first two discovered services (GAP and GATT) are skipped. A name
    /// that appears twice keeps the characteristic registered last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogBuild`] if discovery or any descriptor read fails.
    pub async fn build<T: GattTransport + ?Sized>(transport: &T) -> Result<Self> {
        let services = transport
            .services()
            .await
            .map_err(|e| Error::CatalogBuild {
                characteristic: "service discovery".to_string(),
                reason: e.to_string(),
            })?;

        let mut catalog = Self::new();

        for service in services.iter().skip(MANDATORY_SERVICE_COUNT) {
            let service_uuid = service.uuid.to_uuid().map_err(|e| Error::CatalogBuild {
                characteristic: format!("service {:02x?}", service.uuid.bytes),
                reason: e.to_string(),
            })?;

            for characteristic in &service.characteristics {
                let characteristic_uuid =
                    characteristic
                        .uuid
                        .to_uuid()
                        .map_err(|e| Error::CatalogBuild {
                            characteristic: format!("{:02x?}", characteristic.uuid.bytes),
                            reason: e.to_string(),
                        })?;

                let raw = transport
                    .read_user_description(&characteristic_uuid, &service_uuid)
                    .await
                    .map_err(|e| Error::CatalogBuild {
                        characteristic: characteristic_uuid.to_string(),
                        reason: e.to_string(),
                    })?;

                let name = description_to_name(&raw);
                debug!(
                    "Found characteristic '{}' ({}) in service {}",
                    name, characteristic_uuid, service_uuid
                );

                catalog.insert(
                    name,
                    CharacteristicEntry {
                        characteristic: characteristic_uuid,
                        service: service_uuid,
                    },
                );
            }
        }

        info!("Characteristics: {:?}", catalog.names());

        Ok(catalog)
    }

    /// Register a characteristic under a name, replacing any earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: CharacteristicEntry) {
        let name = name.into();
        if let Some(previous) = self.entries.insert(name.clone(), entry) {
            warn!(
                "Duplicate characteristic name '{}': {} replaces {}",
                name, entry.characteristic, previous.characteristic
            );
        }
    }

    /// Look up a characteristic by name.
    pub fn get(&self, name: &str) -> Option<&CharacteristicEntry> {
        self.entries.get(name)
    }

    /// Look up a characteristic by name, failing for unknown names.
    pub fn resolve(&self, name: &str) -> Result<CharacteristicEntry> {
        self.get(name)
            .copied()
            .ok_or_else(|| Error::UnknownCharacteristic {
                name: name.to_string(),
            })
    }

    /// All characteristic names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of named characteristics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turn a raw user description into a name, dropping the trailing zero bytes.
fn description_to_name(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::MockGattTransport;
    use crate::ble::uuids::*;
    use crate::testing::FakeDevice;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_description_to_name() {
        assert_eq!(description_to_name(b"TPAZ\0"), "TPAZ");
        assert_eq!(description_to_name(b"GPIO pin\0\0"), "GPIO pin");
        assert_eq!(description_to_name(b""), "");
    }

    #[tokio::test]
    async fn test_build_from_device() {
        let device = FakeDevice::smp290();
        let catalog = CharacteristicCatalog::build(&device).await.unwrap();

        assert_eq!(catalog.len(), 17);
        assert_eq!(
            catalog.get("GPIO pin"),
            Some(&CharacteristicEntry {
                characteristic: GPIO_PIN_UUID,
                service: GPIO_SERVICE_UUID,
            })
        );
        assert_eq!(catalog.resolve("VBAT").unwrap().service, MEASUREMENT_SERVICE_UUID);
        assert!(catalog.names().contains(&"Current TX power"));
        // Mandatory services are never read
        assert!(catalog.get("Device Name").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_names_keep_last() {
        let device = FakeDevice::new()
            .with_mandatory_services()
            .with_characteristic(MEASUREMENT_SERVICE_UUID, T_UUID, "Reading", vec![0])
            .with_characteristic(MEASUREMENT_SERVICE_UUID, VBAT_UUID, "Reading", vec![0]);

        let catalog = CharacteristicCatalog::build(&device).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve("Reading").unwrap().characteristic, VBAT_UUID);
    }

    #[tokio::test]
    async fn test_descriptor_failure_fails_build() {
        let device = FakeDevice::smp290().without_description(TSD_UUID);

        let result = CharacteristicCatalog::build(&device).await;

        assert!(matches!(result, Err(Error::CatalogBuild { .. })));
    }

    #[tokio::test]
    async fn test_only_mandatory_services() {
        let mut transport = MockGattTransport::new();
        transport.expect_services().times(1).returning(|| {
            Ok(FakeDevice::new().with_mandatory_services().service_nodes())
        });

        let catalog = CharacteristicCatalog::build(&transport).await.unwrap();

        assert!(catalog.is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = CharacteristicCatalog::new();
        assert!(matches!(
            catalog.resolve("Nope"),
            Err(Error::UnknownCharacteristic { .. })
        ));
    }
}
