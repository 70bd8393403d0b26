//! GATT characteristic handling.
//!
//! Provides functionality for reading and writing characteristics on a
//! connected repellent device.

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Read/write access to characteristics addressed by service and
/// characteristic UUID.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattClient: Send + Sync {
    /// Read a characteristic value.
    async fn read(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>>;

    /// Write a characteristic value with response.
    async fn write(&self, service: Uuid, characteristic: Uuid, data: &[u8]) -> Result<()>;
}

/// Handler for GATT characteristics on a connected device.
pub struct CharacteristicHandler {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by (service, characteristic) UUID.
    characteristics: RwLock<HashMap<(Uuid, Uuid), Characteristic>>,
}

impl CharacteristicHandler {
    /// Create a new characteristic handler for a peripheral.
    ///
    /// Note: Services must be discovered before using this handler.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: RwLock::new(HashMap::new()),
        }
    }

    /// Discover and cache all characteristics.
    ///
    /// This should be called after connecting and discovering services.
    pub fn discover_characteristics(&self) {
        let services = self.peripheral.services();

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in services {
            for characteristic in service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                chars.insert((service.uuid, characteristic.uuid), characteristic);
            }
        }

        debug!("Discovered {} characteristics", chars.len());
    }

    fn lookup(&self, service: Uuid, characteristic: Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(&(service, characteristic))
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            })
    }
}

#[async_trait]
impl GattClient for CharacteristicHandler {
    async fn read(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>> {
        let target = self.lookup(service, characteristic)?;

        let data = self.peripheral.read(&target).await?;

        trace!(
            "Read {} bytes from characteristic {}",
            data.len(),
            characteristic
        );

        Ok(data)
    }

    async fn write(&self, service: Uuid, characteristic: Uuid, data: &[u8]) -> Result<()> {
        let target = self.lookup(service, characteristic)?;

        self.peripheral
            .write(&target, data, WriteType::WithResponse)
            .await?;

        trace!(
            "Wrote {} bytes to characteristic {}",
            data.len(),
            characteristic
        );

        Ok(())
    }
}
