//! Adapter operations used by the scanner and the connection manager.
//!
//! [`Radio`] is implemented for the btleplug [`Adapter`]. Tests substitute
//! a mock so scanning and connection handling run without hardware.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, CentralState, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Peripheral};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::ble::advertising::Advertisement;
use crate::ble::characteristics::{CharacteristicHandler, GattClient};
use crate::error::{Error, Result};

/// Advertisements seen while scanning.
pub type AdvertisementStream = Pin<Box<dyn Stream<Item = Advertisement> + Send>>;

/// Identifiers of peripherals that dropped their connection.
pub type DisconnectStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// A GATT link opened by [`Radio::connect`].
pub struct Link {
    /// Services the device exposes.
    pub services: Vec<uuid::Uuid>,
    /// Characteristic access for the device.
    pub gatt: Arc<dyn GattClient>,
}

/// The Bluetooth operations the crate needs from an adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Radio: Send + Sync {
    /// Check whether the adapter is powered on.
    async fn is_powered_on(&self) -> Result<bool>;

    /// Start scanning for all peripherals.
    async fn start_scan(&self) -> Result<()>;

    /// Stop scanning.
    async fn stop_scan(&self) -> Result<()>;

    /// Subscribe to advertisements. Subscribe before starting a scan.
    async fn advertisements(&self) -> Result<AdvertisementStream>;

    /// Subscribe to disconnect notifications.
    async fn disconnections(&self) -> Result<DisconnectStream>;

    /// Connect to a peripheral and discover its GATT layout.
    async fn connect(&self, device_id: &str) -> Result<Link>;

    /// Disconnect a peripheral.
    async fn disconnect(&self, device_id: &str) -> Result<()>;
}

#[async_trait]
impl Radio for Adapter {
    async fn is_powered_on(&self) -> Result<bool> {
        let state = Central::adapter_state(self).await?;
        Ok(matches!(state, CentralState::PoweredOn))
    }

    async fn start_scan(&self) -> Result<()> {
        // Scan for all devices; filtering happens on our side.
        Central::start_scan(self, ScanFilter::default()).await?;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        Central::stop_scan(self).await?;
        Ok(())
    }

    async fn advertisements(&self) -> Result<AdvertisementStream> {
        let events = Central::events(self).await?;
        let adapter = self.clone();

        let stream = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move {
                match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                        let peripheral = match Central::peripheral(&adapter, &id).await {
                            Ok(p) => p,
                            Err(e) => {
                                trace!("Failed to get peripheral: {}", e);
                                return None;
                            }
                        };
                        match peripheral.properties().await {
                            Ok(Some(properties)) => Some(Advertisement::from_properties(
                                id.to_string(),
                                &properties,
                            )),
                            _ => None,
                        }
                    }
                    _ => None,
                }
            }
        });

        Ok(Box::pin(stream))
    }

    async fn disconnections(&self) -> Result<DisconnectStream> {
        let events = Central::events(self).await?;

        let stream = events.filter_map(|event| async move {
            match event {
                CentralEvent::DeviceDisconnected(id) => Some(id.to_string()),
                _ => None,
            }
        });

        Ok(Box::pin(stream))
    }

    async fn connect(&self, device_id: &str) -> Result<Link> {
        let peripheral = find_peripheral(self, device_id).await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let services: Vec<_> = peripheral.services().iter().map(|s| s.uuid).collect();
        debug!("Available services: {:?}", services);

        let handler = CharacteristicHandler::new(peripheral);
        handler.discover_characteristics();

        Ok(Link {
            services,
            gatt: Arc::new(handler),
        })
    }

    async fn disconnect(&self, device_id: &str) -> Result<()> {
        let peripheral = find_peripheral(self, device_id).await?;
        peripheral.disconnect().await?;
        Ok(())
    }
}

/// Find a peripheral known to the adapter by its identifier.
async fn find_peripheral(adapter: &Adapter, device_id: &str) -> Result<Peripheral> {
    Central::peripherals(adapter)
        .await?
        .into_iter()
        .find(|p| p.id().to_string() == device_id)
        .ok_or_else(|| Error::DeviceNotFound {
            identifier: device_id.to_string(),
        })
}
