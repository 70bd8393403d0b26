//! BLE connection management.
//!
//! Handles connecting to the single repellent device, tracking it, and
//! delivering spray commands.

use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::ble::characteristics::GattClient;
use crate::ble::radio::{DisconnectStream, Link, Radio};
use crate::ble::uuids::{SPRAY_COMMAND_CHARACTERISTIC_UUID, SPRAY_COMMAND_SERVICE_UUID};
use crate::data::ConnectedDevice;
use crate::error::{Error, Result};
use crate::protocol::SprayCommand;

/// Connection state of the managed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    /// The identifier of the peripheral.
    pub identifier: String,
    /// The new connection state.
    pub state: ConnectionState,
}

/// The live link to the connected device.
struct ActiveConnection {
    device: ConnectedDevice,
    gatt: Arc<dyn GattClient>,
}

/// Manages the connection to a single repellent device.
pub struct ConnectionManager {
    /// The radio peripherals are reached through.
    radio: Arc<dyn Radio>,
    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,
    /// The connected device, if any.
    active: Arc<RwLock<Option<ActiveConnection>>>,
    /// Channel for connection events.
    event_tx: broadcast::Sender<ConnectionEvent>,
    /// Task clearing the connection on unsolicited disconnects.
    watcher: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Maximum connection attempts.
    max_attempts: u32,
    /// Delay between attempts.
    retry_delay: Duration,
}

impl ConnectionManager {
    /// Create a new connection manager on a radio.
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            radio,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            active: Arc::new(RwLock::new(None)),
            event_tx,
            watcher: RwLock::new(None),
            max_attempts: 1,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Set the connection retry parameters.
    pub fn set_retry_params(&mut self, max_attempts: u32, delay: Duration) {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = delay;
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if a device is connected.
    pub fn is_connected(&self) -> bool {
        self.active.read().is_some()
    }

    /// Get the connected device.
    pub fn connected_device(&self) -> Option<ConnectedDevice> {
        self.active.read().as_ref().map(|a| a.device.clone())
    }

    /// Get GATT access to the connected device.
    pub fn gatt(&self) -> Option<Arc<dyn GattClient>> {
        self.active.read().as_ref().map(|a| a.gatt.clone())
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.event_tx.subscribe()
    }

    /// Connect to the device with the given identifier.
    ///
    /// Connecting to the device that is already connected returns it
    /// unchanged. Any other connected device is disconnected first.
    pub async fn connect_to_device(&self, device_id: &str) -> Result<ConnectedDevice> {
        if let Some(device) = self.connected_device() {
            if device.device_id == device_id {
                debug!("Already connected to {}", device_id);
                return Ok(device);
            }
            info!(
                "Switching from {} to {}, disconnecting first",
                device.device_id, device_id
            );
            self.disconnect_device().await?;
        }

        self.begin_connecting(device_id)?;

        match self.establish(device_id).await {
            Ok((link, disconnects)) => {
                let device = ConnectedDevice::new(device_id, link.services);
                *self.active.write() = Some(ActiveConnection {
                    device: device.clone(),
                    gatt: link.gatt,
                });
                self.set_state(device_id, ConnectionState::Connected);
                self.watch_disconnects(disconnects, device_id.to_string());

                info!("Successfully connected to device: {}", device_id);
                Ok(device)
            }
            Err(e) => {
                error!("Failed to connect to device {}: {}", device_id, e);
                self.set_state(device_id, ConnectionState::Disconnected);
                match e {
                    Error::DeviceNotFound { .. } => Err(e),
                    e => Err(Error::ConnectionFailed {
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Disconnect the connected device. Does nothing when none is connected.
    ///
    /// If the radio fails to disconnect, the device stays recorded as
    /// connected.
    pub async fn disconnect_device(&self) -> Result<()> {
        let Some(device_id) = self
            .active
            .read()
            .as_ref()
            .map(|a| a.device.device_id.clone())
        else {
            return Ok(());
        };

        self.set_state(&device_id, ConnectionState::Disconnecting);

        match self.radio.disconnect(&device_id).await {
            Ok(()) => {
                self.stop_watcher();
                *self.active.write() = None;
                self.set_state(&device_id, ConnectionState::Disconnected);
                info!("Device disconnected successfully");
                Ok(())
            }
            Err(e) => {
                error!("Error disconnecting device: {}", e);
                if self.is_connected() {
                    self.set_state(&device_id, ConnectionState::Connected);
                }
                Err(Error::DisconnectFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Send a spray command to the connected device.
    pub async fn send_spray_command(&self, intensity: u8) -> Result<()> {
        let gatt = self.gatt().ok_or(Error::NotConnected)?;
        write_spray_command(gatt.as_ref(), intensity).await
    }

    /// Move to `Connecting`, unless another transition is under way.
    fn begin_connecting(&self, device_id: &str) -> Result<()> {
        let old_state = {
            let mut state = self.state.write();
            if state.is_transitioning() {
                return Err(Error::ConnectionFailed {
                    reason: "Connection already in progress".to_string(),
                });
            }
            std::mem::replace(&mut *state, ConnectionState::Connecting)
        };

        debug!(
            "Connection state changed: {} -> {}",
            old_state,
            ConnectionState::Connecting
        );
        let _ = self.event_tx.send(ConnectionEvent {
            identifier: device_id.to_string(),
            state: ConnectionState::Connecting,
        });
        Ok(())
    }

    /// Subscribe to disconnects, then connect with retries.
    async fn establish(&self, device_id: &str) -> Result<(Link, DisconnectStream)> {
        // Subscribed before connecting so an early drop is not missed.
        let disconnects = self.radio.disconnections().await?;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Connection attempt {} of {}", attempts, self.max_attempts);

            match self.radio.connect(device_id).await {
                Ok(link) => return Ok((link, disconnects)),
                Err(e @ Error::DeviceNotFound { .. }) => return Err(e),
                Err(e) if attempts < self.max_attempts => {
                    warn!("Connection attempt {} failed: {}", attempts, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Spawn a task that clears the connection when the device drops off.
    fn watch_disconnects(&self, mut disconnects: DisconnectStream, device_id: String) {
        let active = self.active.clone();
        let state = self.state.clone();
        let event_tx = self.event_tx.clone();

        let handle = tokio::spawn(async move {
            while let Some(id) = disconnects.next().await {
                if id != device_id {
                    continue;
                }

                info!("Device {} disconnected", device_id);
                let cleared = {
                    let mut current = active.write();
                    let matches = current
                        .as_ref()
                        .map(|a| a.device.device_id == device_id)
                        .unwrap_or(false);
                    if matches {
                        *current = None;
                    }
                    matches
                };
                if cleared {
                    *state.write() = ConnectionState::Disconnected;
                    let _ = event_tx.send(ConnectionEvent {
                        identifier: device_id.clone(),
                        state: ConnectionState::Disconnected,
                    });
                }
                break;
            }

            debug!("Disconnect watcher ended");
        });

        if let Some(old) = self.watcher.write().replace(handle) {
            old.abort();
        }
    }

    fn stop_watcher(&self) {
        if let Some(handle) = self.watcher.write().take() {
            handle.abort();
        }
    }

    /// Update the connection state and emit an event.
    fn set_state(&self, identifier: &str, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);

            let _ = self.event_tx.send(ConnectionEvent {
                identifier: identifier.to_string(),
                state: new_state,
            });
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}

/// Encode and write a spray command through a GATT client.
pub(crate) async fn write_spray_command(gatt: &dyn GattClient, intensity: u8) -> Result<()> {
    let command = SprayCommand::new(intensity)?;

    gatt.write(
        SPRAY_COMMAND_SERVICE_UUID,
        SPRAY_COMMAND_CHARACTERISTIC_UUID,
        &command.encode(),
    )
    .await
    .map_err(|e| {
        error!("Failed to send spray command: {}", e);
        Error::CommandFailed {
            reason: e.to_string(),
        }
    })?;

    info!("Spray command sent with intensity: {}", intensity);
    Ok(())
}
