//! Device descriptors.
//!
//! Contains the records describing discovered and connected peripherals.

use uuid::Uuid;

use crate::data::signal::SignalStrength;
use crate::utils::{connected_device_name, fallback_device_name};

/// A peripheral found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveredDevice {
    /// Platform peripheral identifier.
    pub device_id: String,
    /// Advertised name, or `Device XXXX` when none was advertised.
    pub name: String,
    /// Advertised service UUIDs.
    pub uuids: Vec<Uuid>,
    /// Signal strength in dBm at discovery time.
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Create a discovered device, substituting a fallback name if needed.
    pub fn new(
        device_id: impl Into<String>,
        name: Option<&str>,
        uuids: Vec<Uuid>,
        rssi: Option<i16>,
    ) -> Self {
        let device_id = device_id.into();
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => fallback_device_name(&device_id),
        };

        Self {
            device_id,
            name,
            uuids,
            rssi,
        }
    }

    /// Classify the signal strength.
    pub fn signal_strength(&self) -> SignalStrength {
        SignalStrength::from_rssi(self.rssi)
    }
}

/// The peripheral currently connected over GATT.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectedDevice {
    /// Platform peripheral identifier.
    pub device_id: String,
    /// Display name, `Connected Device XXXX`.
    pub name: String,
    /// Services discovered after connecting.
    pub uuids: Vec<Uuid>,
}

impl ConnectedDevice {
    /// Create a connected device record from its discovered services.
    pub fn new(device_id: impl Into<String>, uuids: Vec<Uuid>) -> Self {
        let device_id = device_id.into();
        let name = connected_device_name(&device_id);
        Self {
            device_id,
            name,
            uuids,
        }
    }

    /// Check whether a service was discovered on the device.
    pub fn has_service(&self, uuid: &Uuid) -> bool {
        self.uuids.contains(uuid)
    }
}
