//! BLE scanning functionality.
//!
//! Provides the scanner for discovering VeraShield repellent devices.

use futures::stream::{Stream, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::ble::advertising::{Advertisement, DeviceFilter, DiscoveredDevices};
use crate::ble::radio::Radio;
use crate::data::DiscoveredDevice;
use crate::error::{Error, Result};

/// BLE scanner for discovering repellent devices.
pub struct BleScanner {
    /// The radio to scan with.
    radio: Arc<dyn Radio>,
    /// Relevance filter applied to every advertisement.
    filter: DeviceFilter,
    /// Whether scanning is currently active.
    is_scanning: Arc<RwLock<bool>>,
}

impl BleScanner {
    /// Create a new scanner on the given radio.
    pub fn new(radio: Arc<dyn Radio>, filter: DeviceFilter) -> Self {
        Self {
            radio,
            filter,
            is_scanning: Arc::new(RwLock::new(false)),
        }
    }

    /// Check if currently scanning.
    pub fn is_scanning(&self) -> bool {
        *self.is_scanning.read()
    }

    /// Scan for `timeout` and return every relevant device seen, in
    /// discovery order.
    ///
    /// Dropping the returned future before it completes ends the scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanInProgress`] if another scan is running, or
    /// [`Error::ScanFailed`] if the adapter could not scan.
    pub async fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        let mut guard = ScanGuard::acquire(&self.is_scanning, &self.radio)?;

        info!("Starting BLE scan for repellent devices ({:?})", timeout);

        let result = self.collect(timeout).await;
        guard.finish().await;

        match result {
            Ok(devices) => {
                info!("Scan finished, {} compatible device(s)", devices.len());
                Ok(devices.into_vec())
            }
            Err(e) => {
                error!("Error scanning for devices: {}", e);
                Err(Error::ScanFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Run the scan and gather matching devices until the deadline.
    async fn collect(&self, timeout: Duration) -> Result<DiscoveredDevices> {
        let advertisements = self.radio.advertisements().await?;
        self.radio.start_scan().await?;

        Ok(collect_relevant(advertisements, &self.filter, timeout).await)
    }
}

/// Gather relevant devices from `advertisements` until `timeout` passes or
/// the stream ends.
pub(crate) async fn collect_relevant<S>(
    advertisements: S,
    filter: &DeviceFilter,
    timeout: Duration,
) -> DiscoveredDevices
where
    S: Stream<Item = Advertisement>,
{
    let mut devices = DiscoveredDevices::default();
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    tokio::pin!(advertisements);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            advertisement = advertisements.next() => match advertisement {
                Some(advertisement) if filter.is_relevant(&advertisement) => {
                    let device = advertisement.into_device();
                    let (name, device_id) = (device.name.clone(), device.device_id.clone());
                    if devices.insert(device) {
                        debug!("Found compatible device: {} ({})", name, device_id);
                    }
                }
                Some(_) => {}
                None => {
                    debug!("Advertisement stream ended");
                    break;
                }
            },
        }
    }

    devices
}

/// Marks a scan as running. Clears the mark and stops the radio when
/// dropped, including when the scan future is cancelled.
struct ScanGuard {
    flag: Arc<RwLock<bool>>,
    radio: Arc<dyn Radio>,
    stopped: bool,
}

impl ScanGuard {
    fn acquire(flag: &Arc<RwLock<bool>>, radio: &Arc<dyn Radio>) -> Result<Self> {
        let mut scanning = flag.write();
        if *scanning {
            debug!("Already scanning, rejecting scan request");
            return Err(Error::ScanInProgress);
        }
        *scanning = true;

        Ok(Self {
            flag: flag.clone(),
            radio: radio.clone(),
            stopped: false,
        })
    }

    /// Stop the scan in place.
    async fn finish(&mut self) {
        if let Err(e) = self.radio.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }
        self.stopped = true;
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        *self.flag.write() = false;

        if self.stopped {
            return;
        }

        let radio = self.radio.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = radio.stop_scan().await {
                    warn!("Failed to stop cancelled scan: {}", e);
                }
            });
        } else {
            warn!("No tokio runtime available to stop cancelled scan");
        }
    }
}
