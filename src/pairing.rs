//! Pairing panel controller.
//!
//! Holds the state behind a "Pair Device" panel: checking that Bluetooth is
//! on, scanning, listing compatible devices with their signal strength, and
//! connecting to the one the user picks. Rendering is left to the caller,
//! which reads [`PairingPanel::view`] and listens for [`Toast`]s.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::DEFAULT_SCAN_TIMEOUT;
use crate::data::{BadgeColor, DiscoveredDevice, SignalStrength};
use crate::error::Result;
use crate::service::BluetoothService;
use crate::utils::id_suffix;

/// Name reported to the connect callback when a device has none.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Operations the pairing panel needs from the Bluetooth layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingBackend: Send + Sync {
    /// Check whether Bluetooth is available and powered on.
    async fn is_bluetooth_enabled(&self) -> bool;

    /// Scan for compatible devices.
    async fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>>;

    /// Connect to a device by identifier.
    async fn connect_to_device(&self, device_id: &str) -> Result<()>;
}

#[async_trait]
impl PairingBackend for BluetoothService {
    async fn is_bluetooth_enabled(&self) -> bool {
        BluetoothService::is_bluetooth_enabled(self).await
    }

    async fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        BluetoothService::scan_for_devices(self, timeout).await
    }

    async fn connect_to_device(&self, device_id: &str) -> Result<()> {
        BluetoothService::connect_to_device(self, device_id)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl<T: PairingBackend + ?Sized> PairingBackend for &T {
    async fn is_bluetooth_enabled(&self) -> bool {
        (**self).is_bluetooth_enabled().await
    }

    async fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        (**self).scan_for_devices(timeout).await
    }

    async fn connect_to_device(&self, device_id: &str) -> Result<()> {
        (**self).connect_to_device(device_id).await
    }
}

/// Visual weight of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    /// Informational.
    #[default]
    Default,
    /// Error or warning.
    Destructive,
}

/// A transient notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Visual weight.
    pub variant: ToastVariant,
}

impl Toast {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    fn destructive(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }
}

/// One row of the device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    /// Device identifier.
    pub device_id: String,
    /// Display name.
    pub name: String,
    /// Signal classification.
    pub signal: SignalStrength,
    /// Badge colour for the signal icon.
    pub signal_color: BadgeColor,
    /// Secondary line, e.g. `DD:EE:FF • Good (-62 dBm)`.
    pub detail: String,
    /// Whether a connection to this device is in progress.
    pub connecting: bool,
}

/// Snapshot of everything the panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Show the "Bluetooth Disabled" banner.
    pub show_disabled_banner: bool,
    /// Scan button label.
    pub scan_button_label: &'static str,
    /// Whether the scan button accepts clicks.
    pub scan_button_enabled: bool,
    /// Devices found by the last scan.
    pub devices: Vec<DeviceRow>,
    /// Show the "no devices" hint.
    pub show_empty_state: bool,
}

type ConnectCallback = Box<dyn FnMut(&str) + Send>;

/// State and actions of the pairing panel.
pub struct PairingPanel<B: PairingBackend> {
    backend: B,
    scan_timeout: Duration,
    is_scanning: bool,
    connecting: Option<String>,
    available_devices: Vec<DiscoveredDevice>,
    bluetooth_enabled: Option<bool>,
    toast_tx: mpsc::UnboundedSender<Toast>,
    on_connect: Option<ConnectCallback>,
}

impl<B: PairingBackend> PairingPanel<B> {
    /// Create a panel and the receiver its toasts are delivered on.
    pub fn new(backend: B) -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (toast_tx, toast_rx) = mpsc::unbounded_channel();

        let panel = Self {
            backend,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            is_scanning: false,
            connecting: None,
            available_devices: Vec::new(),
            bluetooth_enabled: None,
            toast_tx,
            on_connect: None,
        };

        (panel, toast_rx)
    }

    /// Set how long a scan runs.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Register the callback invoked with the device name after a successful
    /// connection.
    pub fn on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.on_connect = Some(Box::new(callback));
    }

    /// Whether a scan is running.
    pub fn is_scanning(&self) -> bool {
        self.is_scanning
    }

    /// Identifier of the device being connected, if any.
    pub fn connecting(&self) -> Option<&str> {
        self.connecting.as_deref()
    }

    /// Devices found by the last scan.
    pub fn available_devices(&self) -> &[DiscoveredDevice] {
        &self.available_devices
    }

    /// Last known Bluetooth state; `None` before the first check.
    pub fn bluetooth_enabled(&self) -> Option<bool> {
        self.bluetooth_enabled
    }

    /// Refresh the Bluetooth state, warning the user if it is off.
    pub async fn check_bluetooth_status(&mut self) -> bool {
        let enabled = self.backend.is_bluetooth_enabled().await;
        self.bluetooth_enabled = Some(enabled);

        if !enabled {
            self.toast(Toast::destructive(
                "Bluetooth Disabled",
                "Please enable Bluetooth in your device settings",
            ));
        }

        enabled
    }

    /// Scan for devices and replace the device list with the results.
    pub async fn scan_for_devices(&mut self) {
        self.is_scanning = true;
        self.available_devices.clear();

        if !self.check_bluetooth_status().await {
            self.is_scanning = false;
            return;
        }

        self.toast(Toast::info(
            "Scanning Started",
            "Looking for nearby devices...",
        ));

        let result = self.backend.scan_for_devices(self.scan_timeout).await;
        self.is_scanning = false;

        match result {
            Ok(devices) => {
                info!("Pairing scan found {} device(s)", devices.len());
                if devices.is_empty() {
                    self.toast(Toast::destructive(
                        "No Devices Found",
                        "Make sure your device is in pairing mode and nearby",
                    ));
                } else {
                    self.toast(Toast::info(
                        "Scan Complete",
                        format!("Found {} compatible device(s)", devices.len()),
                    ));
                }
                self.available_devices = devices;
            }
            Err(e) => {
                error!("Device scan failed: {}", e);
                self.toast(Toast::destructive(
                    "Scan Failed",
                    "Could not scan for Bluetooth devices. Check permissions.",
                ));
            }
        }
    }

    /// Connect to a device from the list.
    pub async fn connect_to_device(&mut self, device: &DiscoveredDevice) {
        self.connecting = Some(device.device_id.clone());

        self.toast(Toast::info(
            "Connecting...",
            format!("Connecting to {}", device.name),
        ));

        let result = self.backend.connect_to_device(&device.device_id).await;
        self.connecting = None;

        match result {
            Ok(()) => {
                let name = if device.name.is_empty() {
                    UNKNOWN_DEVICE_NAME
                } else {
                    device.name.as_str()
                };
                if let Some(callback) = self.on_connect.as_mut() {
                    callback(name);
                }

                self.toast(Toast::info(
                    "Device Connected",
                    format!("Successfully connected to {}", device.name),
                ));
            }
            Err(e) => {
                error!("Connection failed: {}", e);
                self.toast(Toast::destructive(
                    "Connection Failed",
                    format!("Could not connect to {}. Please try again.", device.name),
                ));
            }
        }
    }

    /// Build the render model for the current state.
    pub fn view(&self) -> PanelView {
        let disabled = self.bluetooth_enabled == Some(false);

        let devices = self
            .available_devices
            .iter()
            .map(|device| {
                let signal = device.signal_strength();
                let mut detail = format!(
                    "{} \u{2022} {}",
                    id_suffix(&device.device_id, 8),
                    signal.label()
                );
                if let Some(rssi) = device.rssi.filter(|r| *r != 0) {
                    detail.push_str(&format!(" ({} dBm)", rssi));
                }

                DeviceRow {
                    device_id: device.device_id.clone(),
                    name: device.name.clone(),
                    signal,
                    signal_color: signal.color(),
                    detail,
                    connecting: self.connecting.as_deref() == Some(device.device_id.as_str()),
                }
            })
            .collect();

        PanelView {
            show_disabled_banner: disabled,
            scan_button_label: if self.is_scanning {
                "Scanning for BLE devices..."
            } else {
                "Scan for Devices"
            },
            scan_button_enabled: !self.is_scanning && !disabled,
            devices,
            show_empty_state: !self.is_scanning && self.available_devices.is_empty() && !disabled,
        }
    }

    fn toast(&self, toast: Toast) {
        // A dropped receiver just means nobody is rendering toasts.
        let _ = self.toast_tx.send(toast);
    }
}
