//! Process-wide Bluetooth service.
//!
//! Composes the scanner, the connection manager and the data manager behind
//! a single entry point, and initializes the Bluetooth adapter lazily on
//! first use.

use btleplug::api::{Central, Manager as _};
use btleplug::platform::Manager;
use chrono::Utc;
use once_cell::sync::Lazy;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ble::advertising::DeviceFilter;
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::ble::radio::Radio;
use crate::ble::scanner::BleScanner;
use crate::config::ServiceConfig;
use crate::data::{ConnectedDevice, DeviceData, DiscoveredDevice};
use crate::data_manager::DataManager;
use crate::error::{Error, Result};

static INSTANCE: Lazy<BluetoothService> =
    Lazy::new(|| BluetoothService::new(ServiceConfig::default()));

/// Components that need a radio before they exist.
struct Components {
    radio: Arc<dyn Radio>,
    scanner: BleScanner,
    connection: Arc<ConnectionManager>,
    /// Task forgetting telemetry when the device drops off.
    listener: JoinHandle<()>,
}

impl Drop for Components {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Entry point for scanning, pairing and querying a repellent device.
pub struct BluetoothService {
    config: ServiceConfig,
    source: Option<Arc<dyn Radio>>,
    components: OnceCell<Components>,
    data_manager: Arc<DataManager>,
}

impl BluetoothService {
    /// Create a service that opens the first system adapter on first use.
    ///
    /// Most applications should use [`BluetoothService::instance`] instead.
    pub fn new(config: ServiceConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a service on an already opened radio.
    pub fn with_radio(config: ServiceConfig, radio: Arc<dyn Radio>) -> Self {
        Self::build(config, Some(radio))
    }

    fn build(config: ServiceConfig, source: Option<Arc<dyn Radio>>) -> Self {
        Self {
            config,
            source,
            components: OnceCell::new(),
            data_manager: Arc::new(DataManager::new()),
        }
    }

    /// Get the process-wide service.
    pub fn instance() -> &'static BluetoothService {
        &INSTANCE
    }

    /// Get the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Acquire the Bluetooth adapter. Later calls return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] if no adapter can be opened.
    pub async fn initialize(&self) -> Result<()> {
        self.components().await.map(|_| ())
    }

    /// Check whether Bluetooth is available and powered on.
    pub async fn is_bluetooth_enabled(&self) -> bool {
        let components = match self.components().await {
            Ok(components) => components,
            Err(e) => {
                error!("Error checking Bluetooth status: {}", e);
                return false;
            }
        };

        match components.radio.is_powered_on().await {
            Ok(powered) => powered,
            Err(e) => {
                error!("Error checking Bluetooth status: {}", e);
                false
            }
        }
    }

    /// Scan for compatible devices.
    pub async fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        let components = self.components().await?;
        components.scanner.scan_for_devices(timeout).await
    }

    /// Scan for the configured duration.
    pub async fn scan(&self) -> Result<Vec<DiscoveredDevice>> {
        self.scan_for_devices(self.config.scan_timeout).await
    }

    /// Connect to a device and read its telemetry.
    ///
    /// Telemetry cached for any other device is dropped first.
    pub async fn connect_to_device(&self, device_id: &str) -> Result<ConnectedDevice> {
        let components = self.components().await?;
        let reconnect = components
            .connection
            .connected_device()
            .map(|d| d.device_id == device_id)
            .unwrap_or(false);

        let device = components.connection.connect_to_device(device_id).await?;

        if !reconnect {
            self.data_manager.clear_device_data();
        }
        self.read_device_data().await;

        Ok(device)
    }

    /// Disconnect the connected device and forget its telemetry.
    pub async fn disconnect_device(&self) -> Result<()> {
        if let Some(components) = self.components.get() {
            components.connection.disconnect_device().await?;
        }
        self.data_manager.clear_device_data();
        Ok(())
    }

    /// Send a spray command to the connected device.
    pub async fn send_spray_command(&self, intensity: u8) -> Result<()> {
        let components = self.components.get().ok_or(Error::NotConnected)?;
        components.connection.send_spray_command(intensity).await?;
        self.data_manager.record_spray(Utc::now());
        Ok(())
    }

    /// Send a spray command at the configured default intensity.
    pub async fn send_default_spray_command(&self) -> Result<()> {
        self.send_spray_command(self.config.default_spray_intensity)
            .await
    }

    /// Get the connected device.
    pub fn connected_device(&self) -> Option<ConnectedDevice> {
        self.components
            .get()
            .and_then(|components| components.connection.connected_device())
    }

    /// Check whether a device is connected.
    pub fn is_connected(&self) -> bool {
        self.components
            .get()
            .map(|components| components.connection.is_connected())
            .unwrap_or(false)
    }

    /// Read telemetry from the connected device, or placeholder data if
    /// none is connected.
    pub async fn read_device_data(&self) -> DeviceData {
        let gatt = self
            .components
            .get()
            .and_then(|components| components.connection.gatt());

        match gatt {
            Some(gatt) => self.data_manager.read_device_data(gatt.as_ref()).await,
            None => self.data_manager.placeholder_data(),
        }
    }

    /// Get the cached telemetry, or placeholder data if not connected.
    pub fn device_data(&self) -> DeviceData {
        if self.is_connected() {
            self.data_manager.device_data()
        } else {
            self.data_manager.placeholder_data()
        }
    }

    /// Re-read telemetry if connected, otherwise return placeholder data.
    pub async fn refresh_device_data(&self) -> DeviceData {
        if self.is_connected() {
            self.read_device_data().await
        } else {
            self.data_manager.placeholder_data()
        }
    }

    async fn components(&self) -> Result<&Components> {
        self.components
            .get_or_try_init(|| async {
                let radio = match &self.source {
                    Some(radio) => Ok(radio.clone()),
                    None => open_adapter().await,
                };
                match radio {
                    Ok(radio) => {
                        info!("Bluetooth service initialized successfully");
                        Ok(assemble(&self.config, radio, self.data_manager.clone()))
                    }
                    Err(e) => {
                        error!("Failed to initialize Bluetooth service: {}", e);
                        Err(e)
                    }
                }
            })
            .await
    }
}

/// Open the first Bluetooth adapter of the system.
async fn open_adapter() -> Result<Arc<dyn Radio>> {
    let manager = Manager::new()
        .await
        .map_err(|_e| Error::BluetoothUnavailable)?;

    let adapter = manager
        .adapters()
        .await
        .map_err(|_e| Error::BluetoothUnavailable)?
        .into_iter()
        .next()
        .ok_or(Error::BluetoothUnavailable)?;

    info!(
        "Using Bluetooth adapter: {:?}",
        adapter.adapter_info().await.ok()
    );

    let radio: Arc<dyn Radio> = Arc::new(adapter);
    Ok(radio)
}

fn assemble(config: &ServiceConfig, radio: Arc<dyn Radio>, data: Arc<DataManager>) -> Components {
    let scanner = BleScanner::new(radio.clone(), DeviceFilter::from_config(config));
    let mut connection = ConnectionManager::new(radio.clone());
    connection.set_retry_params(config.connect_attempts, config.reconnect_delay);
    let connection = Arc::new(connection);

    let listener = tokio::spawn(forget_on_disconnect(
        connection.subscribe(),
        Arc::downgrade(&connection),
        data,
    ));

    Components {
        radio,
        scanner,
        connection,
        listener,
    }
}

/// Clear cached telemetry once the connection is gone, whether the user or
/// the device ended it.
async fn forget_on_disconnect(
    mut events: broadcast::Receiver<crate::ble::ConnectionEvent>,
    connection: Weak<ConnectionManager>,
    data: Arc<DataManager>,
) {
    loop {
        match events.recv().await {
            Ok(event) if event.state == ConnectionState::Disconnected => {
                let Some(connection) = connection.upgrade() else {
                    break;
                };
                if !connection.is_connected() {
                    debug!("Forgetting telemetry of {}", event.identifier);
                    data.clear_device_data();
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Missed {} connection events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::characteristics::MockGattClient;
    use crate::ble::radio::{DisconnectStream, Link, MockRadio};
    use crate::ble::uuids::*;
    use futures::channel::mpsc;
    use futures::stream;
    use pretty_assertions::assert_eq;

    /// A device that only reports its battery level and firmware revision.
    fn device_link(battery: u8, firmware: &'static str) -> Link {
        let mut gatt = MockGattClient::new();
        gatt.expect_read().returning(move |_, characteristic| {
            if characteristic == BATTERY_LEVEL_UUID {
                Ok(vec![battery])
            } else if characteristic == FIRMWARE_REVISION_UUID {
                Ok(firmware.as_bytes().to_vec())
            } else {
                Err(Error::CharacteristicNotFound {
                    uuid: characteristic.to_string(),
                })
            }
        });
        Link {
            services: vec![REPELLENT_SERVICE_UUID],
            gatt: Arc::new(gatt),
        }
    }

    /// A device whose characteristics cannot be read.
    fn silent_link() -> Link {
        let mut gatt = MockGattClient::new();
        gatt.expect_read()
            .returning(|_, _| Err(Error::NotConnected));
        Link {
            services: vec![],
            gatt: Arc::new(gatt),
        }
    }

    fn quiet() -> DisconnectStream {
        Box::pin(stream::pending())
    }

    #[test]
    fn test_instance_is_shared() {
        let a = BluetoothService::instance() as *const BluetoothService;
        let b = BluetoothService::instance() as *const BluetoothService;
        assert_eq!(a, b);
    }

    #[test]
    fn test_uninitialized_service_is_disconnected() {
        let service = BluetoothService::new(ServiceConfig::default());
        assert!(!service.is_connected());
        assert_eq!(service.connected_device(), None);
        assert_eq!(service.device_data(), DeviceData::placeholder());
    }

    #[test]
    fn test_placeholder_reads_without_connection() {
        let service = BluetoothService::new(ServiceConfig::default());
        assert_eq!(
            tokio_test::block_on(service.read_device_data()),
            DeviceData::placeholder()
        );
        assert_eq!(
            tokio_test::block_on(service.refresh_device_data()),
            DeviceData::placeholder()
        );
    }

    #[tokio::test]
    async fn test_spray_requires_connection() {
        let service = BluetoothService::new(ServiceConfig::default());
        let err = service.send_spray_command(50).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        let err = service.send_default_spray_command().await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let service = BluetoothService::new(ServiceConfig::default());
        service.disconnect_device().await.unwrap();
        assert!(!service.is_connected());
    }

    #[tokio::test]
    async fn test_bluetooth_enabled_follows_radio() {
        let mut seq = mockall::Sequence::new();
        let mut radio = MockRadio::new();
        radio
            .expect_is_powered_on()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(true));
        radio
            .expect_is_powered_on()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(Error::BluetoothUnavailable));
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        assert!(service.is_bluetooth_enabled().await);
        assert!(!service.is_bluetooth_enabled().await);
    }

    #[tokio::test]
    async fn test_connect_reads_device_data() {
        let mut radio = MockRadio::new();
        radio.expect_disconnections().returning(|| Ok(quiet()));
        radio
            .expect_connect()
            .returning(|_| Ok(device_link(90, "2.0.0")));
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        let device = service.connect_to_device("a").await.unwrap();

        assert_eq!(device.device_id, "a");
        assert!(service.is_connected());
        let data = service.device_data();
        assert_eq!(data.battery_level, Some(90));
        assert_eq!(data.firmware_version.as_deref(), Some("2.0.0"));
        assert_eq!(data.spray_count, None);
    }

    #[tokio::test]
    async fn test_switching_devices_drops_previous_data() {
        let mut radio = MockRadio::new();
        radio.expect_disconnections().returning(|| Ok(quiet()));
        radio
            .expect_connect()
            .returning(|id| {
                if id.to_string() == "a" {
                    Ok(device_link(90, "1.0.0"))
                } else {
                    Ok(silent_link())
                }
            });
        radio.expect_disconnect().times(1).returning(|_| Ok(()));
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        service.connect_to_device("a").await.unwrap();
        assert_eq!(service.device_data().battery_level, Some(90));

        service.connect_to_device("b").await.unwrap();

        let data = service.device_data();
        assert_eq!(service.connected_device().unwrap().device_id, "b");
        assert_eq!(data.battery_level, None);
        assert_eq!(data.firmware_version, None);
    }

    #[tokio::test]
    async fn test_reconnecting_same_device_keeps_data() {
        let mut radio = MockRadio::new();
        radio.expect_disconnections().times(1).returning(|| Ok(quiet()));
        radio
            .expect_connect()
            .times(1)
            .returning(|_| Ok(device_link(70, "1.0.0")));
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        service.connect_to_device("a").await.unwrap();
        service.connect_to_device("a").await.unwrap();

        assert_eq!(service.device_data().battery_level, Some(70));
    }

    #[tokio::test]
    async fn test_device_dropping_off_clears_data() {
        let (drop_tx, drop_rx) = mpsc::unbounded::<String>();
        let disconnects: DisconnectStream = Box::pin(drop_rx);

        let mut radio = MockRadio::new();
        radio
            .expect_disconnections()
            .times(1)
            .return_once(move || Ok(disconnects));
        radio
            .expect_connect()
            .returning(|_| Ok(device_link(55, "1.0.0")));
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        service.connect_to_device("a").await.unwrap();
        assert_eq!(service.data_manager.device_data().battery_level, Some(55));

        drop_tx.unbounded_send("a".to_string()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while service.is_connected() || !service.data_manager.device_data().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(service.device_data(), DeviceData::placeholder());
    }

    #[tokio::test]
    async fn test_spray_records_time() {
        let mut gatt = MockGattClient::new();
        gatt.expect_read().returning(|_, _| Err(Error::NotConnected));
        gatt.expect_write()
            .withf(|_, _, data| data == [0x01, 50])
            .times(1)
            .returning(|_, _, _| Ok(()));
        let gatt: Arc<dyn crate::ble::GattClient> = Arc::new(gatt);

        let mut radio = MockRadio::new();
        radio.expect_disconnections().returning(|| Ok(quiet()));
        radio.expect_connect().return_once(move |_| {
            Ok(Link {
                services: vec![],
                gatt,
            })
        });
        let service = BluetoothService::with_radio(ServiceConfig::default(), Arc::new(radio));

        service.connect_to_device("a").await.unwrap();
        service.send_default_spray_command().await.unwrap();

        assert!(service.device_data().last_spray_time.is_some());
    }
}
