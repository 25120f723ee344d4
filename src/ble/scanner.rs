//! BLE scanning functionality.
//!
//! Turns manufacturer data advertisements from SMP290 sensors into
//! [`AdvertisingReport`]s.

use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::ble::advertising::{AdvertisementType, AdvertisingReport};
use crate::ble::uuids::SMP290_COMPANY_ID;
use crate::error::{Error, Result};

/// Build a report from the manufacturer data of one advertisement.
///
/// btleplug strips the company identifier from manufacturer data; it is put
/// back in front, least significant byte first, as it appears on air.
/// Returns `None` if the advertisement carries no SMP290 data.
pub fn report_from_manufacturer_data(
    address: BDAddr,
    rssi: i16,
    manufacturer_data: &HashMap<u16, Vec<u8>>,
) -> Option<AdvertisingReport> {
    let payload = manufacturer_data.get(&SMP290_COMPANY_ID)?;

    let mut data = Vec::with_capacity(payload.len() + 2);
    data.extend_from_slice(&SMP290_COMPANY_ID.to_le_bytes());
    data.extend_from_slice(payload);

    Some(AdvertisingReport {
        address,
        rssi,
        // The PDU type is not exposed by btleplug; SMP290 firmware always
        // advertises connectable undirected.
        advertisement_type: AdvertisementType::ConnectableUndirected,
        manufacturer_data: data,
    })
}

/// BLE scanner for SMP290 sensors.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Whether scanning is currently active.
    is_scanning: Arc<RwLock<bool>>,
    /// Channel for advertising reports.
    event_tx: broadcast::Sender<AdvertisingReport>,
    /// Handle to the scanning task.
    scan_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl BleScanner {
    /// Create a new BLE scanner on the first adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let adapter = first_adapter().await?;
        Ok(Self::with_adapter(adapter))
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        let (event_tx, _) = broadcast::channel(256);

        Self {
            adapter,
            is_scanning: Arc::new(RwLock::new(false)),
            event_tx,
            scan_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start scanning for sensors.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning cannot be started.
    pub async fn start_scanning(&self) -> Result<()> {
        if *self.is_scanning.read() {
            debug!("Already scanning, ignoring start request");
            return Ok(());
        }

        info!("Starting BLE scan for SMP290 sensors");

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        *self.is_scanning.write() = true;

        let adapter = self.adapter.clone();
        let is_scanning = self.is_scanning.clone();
        let event_tx = self.event_tx.clone();

        let handle = tokio::spawn(async move {
            let mut events = match adapter.events().await {
                Ok(events) => events,
                Err(e) => {
                    error!("Failed to get adapter events: {}", e);
                    return;
                }
            };

            while *is_scanning.read() {
                tokio::select! {
                    Some(event) = events.next() => {
                        Self::handle_event(event, &adapter, &event_tx).await;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if !*is_scanning.read() {
                            break;
                        }
                    }
                }
            }

            debug!("Scan event loop ended");
        });

        *self.scan_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop scanning.
    pub async fn stop_scanning(&self) -> Result<()> {
        if !*self.is_scanning.read() {
            debug!("Not scanning, ignoring stop request");
            return Ok(());
        }

        info!("Stopping BLE scan");

        *self.is_scanning.write() = false;

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        let handle = self.scan_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Check if currently scanning.
    pub fn is_scanning(&self) -> bool {
        *self.is_scanning.read()
    }

    /// Subscribe to advertising reports.
    pub fn subscribe(&self) -> broadcast::Receiver<AdvertisingReport> {
        self.event_tx.subscribe()
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    async fn handle_event(
        event: CentralEvent,
        adapter: &Adapter,
        event_tx: &broadcast::Sender<AdvertisingReport>,
    ) {
        match event {
            CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } => {
                if manufacturer_data.contains_key(&SMP290_COMPANY_ID) {
                    trace!("SMP290 advertisement: {:?}", id);
                    Self::process_advertisement(adapter, id, &manufacturer_data, event_tx).await;
                }
            }
            CentralEvent::DeviceDiscovered(id) => {
                trace!("Device discovered: {:?}", id);
            }
            CentralEvent::DeviceUpdated(_) => {}
            CentralEvent::DeviceConnected(id) => {
                debug!("Device connected: {:?}", id);
            }
            CentralEvent::DeviceDisconnected(id) => {
                debug!("Device disconnected: {:?}", id);
            }
            CentralEvent::ServiceDataAdvertisement { .. } => {}
            CentralEvent::ServicesAdvertisement { .. } => {}
            CentralEvent::StateUpdate(_) => {}
        }
    }

    async fn process_advertisement(
        adapter: &Adapter,
        id: PeripheralId,
        manufacturer_data: &HashMap<u16, Vec<u8>>,
        event_tx: &broadcast::Sender<AdvertisingReport>,
    ) {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return,
        };

        let Some(rssi) = properties.rssi else {
            trace!("No RSSI for {}, skipping advertisement", properties.address);
            return;
        };

        if let Some(report) =
            report_from_manufacturer_data(properties.address, rssi, manufacturer_data)
        {
            // No receivers is fine
            let _ = event_tx.send(report);
        }
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        *self.is_scanning.write() = false;
    }
}

/// Get the first Bluetooth adapter of the system.
///
/// # Errors
///
/// Returns [`Error::BluetoothUnavailable`] if there is no adapter.
pub async fn first_adapter() -> Result<Adapter> {
    let manager = Manager::new()
        .await
        .map_err(|_e| Error::BluetoothUnavailable)?;

    let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

    let adapter = adapters
        .into_iter()
        .next()
        .ok_or(Error::BluetoothUnavailable)?;

    info!(
        "Using Bluetooth adapter: {:?}",
        adapter.adapter_info().await.ok()
    );

    Ok(adapter)
}
