//! In-memory device and operator for tests.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::ble::transport::{CharacteristicNode, GattTransport, ServiceNode};
use crate::ble::uuids::*;
use crate::error::{Error, Result};
use crate::session::operator::Operator;

struct FakeCharacteristic {
    uuid: Uuid,
    description: Option<Vec<u8>>,
}

struct FakeService {
    uuid: Uuid,
    characteristics: Vec<FakeCharacteristic>,
}

/// A GATT device that keeps characteristic values in memory.
#[derive(Default)]
pub(crate) struct FakeDevice {
    services: Vec<FakeService>,
    values: Mutex<HashMap<Uuid, Vec<u8>>>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    reads: Mutex<Vec<Uuid>>,
    ignored_writes: HashSet<Uuid>,
}

impl FakeDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A device laid out like an SMP290.
    pub(crate) fn smp290() -> Self {
        Self::new()
            .with_mandatory_services()
            .with_characteristic(CUSTOM_SERVICE_UUID, TX_POWER_UUID, "Current TX power", vec![0xFC])
            .with_characteristic(CUSTOM_SERVICE_UUID, COUNTER_UUID, "Counter value", vec![0x00, 0x2A])
            .with_characteristic(CUSTOM_SERVICE_UUID, TSD_UUID, "TSD", vec![1])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_VALUE_UUID, "GPIO value", vec![0])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_MODE_UUID, "GPIO mode", vec![1, 0])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_DRIVE_STRENGTH_UUID, "GPIO drive strength", vec![0])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_PULL_UUID, "GPIO pull resistors", vec![0])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_INPUT_LEVEL_UUID, "GPIO input level", vec![1])
            .with_characteristic(GPIO_SERVICE_UUID, GPIO_PIN_UUID, "GPIO pin", vec![0])
            .with_characteristic(MAINTENANCE_SERVICE_UUID, HW_VERSION_UUID, "HW Version", b"B1".to_vec())
            .with_characteristic(MAINTENANCE_SERVICE_UUID, FW_VERSION_UUID, "FW Version", b"1.2.0\0".to_vec())
            .with_characteristic(MAINTENANCE_SERVICE_UUID, DATA_BACKUP_UUID, "Data Backup", vec![0])
            .with_characteristic(MAINTENANCE_SERVICE_UUID, TP_SELFTEST_UUID, "TP Selftest", vec![0])
            .with_characteristic(MEASUREMENT_SERVICE_UUID, T_UUID, "T", vec![0x00, 0x19])
            .with_characteristic(
                MEASUREMENT_SERVICE_UUID,
                TPAZ_UUID,
                "TPAZ",
                vec![0x00, 0x19, 0x00, 0x00, 0x08, 0x00],
            )
            .with_characteristic(
                MEASUREMENT_SERVICE_UUID,
                TAZAX_UUID,
                "TAZAX",
                vec![0x00, 0x14, 0x04, 0x00, 0x08, 0x00],
            )
            .with_characteristic(MEASUREMENT_SERVICE_UUID, VBAT_UUID, "VBAT", vec![0x00, 0xC8])
    }

    /// Add the GAP and GATT services, whose characteristics have no descriptions.
    pub(crate) fn with_mandatory_services(mut self) -> Self {
        for (service, characteristic) in [
            (GAP_SERVICE_UUID, Uuid::from_u128(0x00002a00_0000_1000_8000_00805f9b34fb)),
            (GATT_SERVICE_UUID, Uuid::from_u128(0x00002a05_0000_1000_8000_00805f9b34fb)),
        ] {
            self.services.push(FakeService {
                uuid: service,
                characteristics: vec![FakeCharacteristic {
                    uuid: characteristic,
                    description: None,
                }],
            });
        }
        self
    }

    pub(crate) fn with_characteristic(
        mut self,
        service: Uuid,
        characteristic: Uuid,
        name: &str,
        value: Vec<u8>,
    ) -> Self {
        let mut description = name.as_bytes().to_vec();
        description.push(0);
        let node = FakeCharacteristic {
            uuid: characteristic,
            description: Some(description),
        };

        match self.services.iter_mut().find(|s| s.uuid == service) {
            Some(existing) => existing.characteristics.push(node),
            None => self.services.push(FakeService {
                uuid: service,
                characteristics: vec![node],
            }),
        }
        self.values.get_mut().insert(characteristic, value);
        self
    }

    pub(crate) fn without_description(mut self, characteristic: Uuid) -> Self {
        for node in self.services.iter_mut().flat_map(|s| s.characteristics.iter_mut()) {
            if node.uuid == characteristic {
                node.description = None;
            }
        }
        self
    }

    /// Accept writes to a characteristic without changing its value.
    pub(crate) fn ignoring_writes_to(mut self, characteristic: Uuid) -> Self {
        self.ignored_writes.insert(characteristic);
        self
    }

    pub(crate) fn service_nodes(&self) -> Vec<ServiceNode> {
        self.services
            .iter()
            .map(|service| ServiceNode {
                uuid: UuidBase::from(service.uuid),
                characteristics: service
                    .characteristics
                    .iter()
                    .map(|c| CharacteristicNode {
                        uuid: UuidBase::from(c.uuid),
                    })
                    .collect(),
            })
            .collect()
    }

    pub(crate) fn set_value(&self, characteristic: Uuid, value: Vec<u8>) {
        self.values.lock().insert(characteristic, value);
    }

    pub(crate) fn value(&self, characteristic: &Uuid) -> Option<Vec<u8>> {
        self.values.lock().get(characteristic).cloned()
    }

    /// Characteristic writes in order.
    pub(crate) fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.lock().clone()
    }

    /// Characteristic value reads in order; descriptor reads are not included.
    pub(crate) fn reads(&self) -> Vec<Uuid> {
        self.reads.lock().clone()
    }

    fn find(&self, characteristic: &Uuid, service: &Uuid) -> Option<&FakeCharacteristic> {
        self.services
            .iter()
            .filter(|s| s.uuid == *service)
            .flat_map(|s| s.characteristics.iter())
            .find(|c| c.uuid == *characteristic)
    }

    fn not_found(characteristic: &Uuid) -> Error {
        Error::CharacteristicNotFound {
            uuid: characteristic.to_string(),
        }
    }
}

#[async_trait]
impl GattTransport for FakeDevice {
    async fn services(&self) -> Result<Vec<ServiceNode>> {
        Ok(self.service_nodes())
    }

    async fn read_user_description(&self, characteristic: &Uuid, service: &Uuid) -> Result<Vec<u8>> {
        self.find(characteristic, service)
            .ok_or_else(|| Self::not_found(characteristic))?
            .description
            .clone()
            .ok_or_else(|| Error::DescriptorNotFound {
                uuid: characteristic.to_string(),
            })
    }

    async fn read_characteristic(&self, characteristic: &Uuid, service: &Uuid) -> Result<Vec<u8>> {
        self.find(characteristic, service)
            .ok_or_else(|| Self::not_found(characteristic))?;
        self.reads.lock().push(*characteristic);
        self.value(characteristic)
            .ok_or_else(|| Self::not_found(characteristic))
    }

    async fn write_characteristic(
        &self,
        characteristic: &Uuid,
        service: &Uuid,
        data: &[u8],
    ) -> Result<()> {
        self.find(characteristic, service)
            .ok_or_else(|| Self::not_found(characteristic))?;
        self.writes.lock().push((*characteristic, data.to_vec()));
        if !self.ignored_writes.contains(characteristic) {
            self.set_value(*characteristic, data.to_vec());
        }
        Ok(())
    }
}

/// An operator that answers from a script and records what it was shown.
#[derive(Default)]
pub(crate) struct ScriptedOperator {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    shown: Vec<String>,
}

impl ScriptedOperator {
    pub(crate) fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub(crate) fn shown(&self) -> Vec<String> {
        self.shown.clone()
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn ask(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "script exhausted").into()
        })
    }

    fn show(&mut self, line: &str) {
        self.shown.push(line.to_string());
    }
}
