//! Device manager for SMP290 sensors seen while scanning.
//!
//! This module decodes the advertising reports delivered by the scanner,
//! keeps track of every advertiser and emits one data record per decoded
//! report.

use btleplug::api::BDAddr;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::ble::advertising::{AdvertisementType, AdvertisingReport};
use crate::ble::scanner::BleScanner;
use crate::data::{DecodedMeasurement, MeasurementRecord};
use crate::error::Result;
use crate::protocol::calibration::PressureRevision;

/// Tracing target of the structured data records.
pub const DATA_LOG_TARGET: &str = "smp290_ble::data";

/// Devices seen during the lifetime of the process.
///
/// Entries are keyed by the formatted address and never removed.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    known_devices: RwLock<HashMap<String, BDAddr>>,
    connectable_devices: RwLock<HashMap<String, BDAddr>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advertiser.
    ///
    /// Returns `true` if the device was added to the connectable devices.
    pub fn record(
        &self,
        key: &str,
        address: BDAddr,
        advertisement_type: AdvertisementType,
    ) -> bool {
        self.known_devices.write().insert(key.to_string(), address);

        if !advertisement_type.is_connectable_undirected() {
            return false;
        }

        let mut connectable = self.connectable_devices.write();
        if connectable.contains_key(key) {
            return false;
        }
        connectable.insert(key.to_string(), address);
        true
    }

    /// All devices seen.
    pub fn known_devices(&self) -> HashMap<String, BDAddr> {
        self.known_devices.read().clone()
    }

    /// Devices that advertised as connectable.
    pub fn connectable_devices(&self) -> HashMap<String, BDAddr> {
        self.connectable_devices.read().clone()
    }

    /// Check if a device has advertised as connectable.
    pub fn is_connectable(&self, key: &str) -> bool {
        self.connectable_devices.read().contains_key(key)
    }

    /// Number of devices seen.
    pub fn known_count(&self) -> usize {
        self.known_devices.read().len()
    }

    /// Number of connectable devices.
    pub fn connectable_count(&self) -> usize {
        self.connectable_devices.read().len()
    }
}

/// A decoded advertisement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementEvent {
    /// Formatted address of the sensor.
    pub address: String,
    /// Signal strength in dBm.
    pub rssi: i16,
    /// Advertising PDU type.
    pub advertisement_type: AdvertisementType,
    /// The calibrated values.
    pub measurement: DecodedMeasurement,
    /// Reception time.
    pub received_at: DateTime<Utc>,
}

impl MeasurementEvent {
    /// The structured data record of this event.
    pub fn record(&self) -> MeasurementRecord<'_> {
        MeasurementRecord {
            received_at: self.received_at,
            address: &self.address,
            rssi: self.rssi,
            measurement: &self.measurement,
        }
    }
}

/// Handle one advertising report.
///
/// Reports that do not decode are skipped silently. Decoded reports update
/// the registry and are logged twice: a readable line and a data record on
/// [`DATA_LOG_TARGET`].
pub fn process_report(
    registry: &DeviceRegistry,
    revision: PressureRevision,
    report: &AdvertisingReport,
) -> Option<MeasurementEvent> {
    let measurement = report.measurement(revision)?;
    let address = report.address_string();

    if registry.record(&address, report.address, report.advertisement_type) {
        info!("New connectable SMP290: {}", address);
    }

    let event = MeasurementEvent {
        address,
        rssi: report.rssi,
        advertisement_type: report.advertisement_type,
        measurement,
        received_at: Utc::now(),
    };

    debug!(
        "{} {} {} dBm: {}",
        event.advertisement_type,
        event.address,
        event.rssi,
        event.measurement.summary()
    );
    info!(target: DATA_LOG_TARGET, "{}", event.record());

    Some(event)
}

/// Central manager for scanning SMP290 sensors.
pub struct DeviceManager {
    /// BLE scanner.
    scanner: Arc<BleScanner>,
    /// Devices seen so far.
    registry: Arc<DeviceRegistry>,
    /// Calibration used for decoding.
    revision: PressureRevision,
    /// Measurement channel.
    measurement_tx: broadcast::Sender<MeasurementEvent>,
    /// Background task handle.
    background_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Running flag.
    is_running: Arc<AtomicBool>,
}

impl DeviceManager {
    /// Create a new DeviceManager on the first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(revision: PressureRevision) -> Result<Self> {
        let scanner = BleScanner::new().await?;
        Ok(Self::with_scanner(scanner, revision))
    }

    /// Create a DeviceManager around an existing scanner.
    pub fn with_scanner(scanner: BleScanner, revision: PressureRevision) -> Self {
        let (measurement_tx, _) = broadcast::channel(256);

        Self {
            scanner: Arc::new(scanner),
            registry: Arc::new(DeviceRegistry::new()),
            revision,
            measurement_tx,
            background_handle: RwLock::new(None),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start scanning and decoding advertisements.
    pub async fn start_scanning(&self) -> Result<()> {
        if self.is_running.load(Ordering::SeqCst) {
            debug!("Already scanning");
            return Ok(());
        }

        info!(
            "Starting device manager scanning with pressure {}",
            self.revision
        );

        // Subscribe before the first report can arrive
        let mut rx = self.scanner.subscribe();
        self.scanner.start_scanning().await?;
        self.is_running.store(true, Ordering::SeqCst);

        let registry = self.registry.clone();
        let revision = self.revision;
        let measurement_tx = self.measurement_tx.clone();
        let is_running = self.is_running.clone();

        let handle = tokio::spawn(async move {
            while is_running.load(Ordering::SeqCst) {
                tokio::select! {
                    Ok(report) = rx.recv() => {
                        if let Some(event) = process_report(&registry, revision, &report) {
                            let _ = measurement_tx.send(event);
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
            }

            debug!("Device manager background task ended");
        });

        *self.background_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop scanning.
    pub async fn stop_scanning(&self) -> Result<()> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("Stopping device manager scanning");

        self.is_running.store(false, Ordering::SeqCst);
        self.scanner.stop_scanning().await?;

        let handle = self.background_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Subscribe to decoded measurements.
    pub fn subscribe(&self) -> broadcast::Receiver<MeasurementEvent> {
        self.measurement_tx.subscribe()
    }

    /// The registry of seen devices.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Check if scanning is active.
    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    /// Clean shutdown of scanning.
    pub async fn shutdown(&self) -> Result<()> {
        info!(
            "Shutting down device manager ({} devices seen, {} connectable)",
            self.registry.known_count(),
            self.registry.connectable_count()
        );
        self.stop_scanning().await
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
    }
}
