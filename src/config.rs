//! Runtime configuration for scanning, connecting and spraying.

use std::time::Duration;

use uuid::Uuid;

use crate::ble::uuids::TARGET_SERVICE_UUIDS;

/// Default scan duration.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default spray intensity (percent).
pub const DEFAULT_SPRAY_INTENSITY: u8 = 50;

/// RSSI above which an unnamed, service-less device is treated as nearby.
pub const DEFAULT_MIN_RSSI: i16 = -60;

/// Name fragments used by VeraShield and compatible repellent devices.
pub const DEFAULT_NAME_KEYWORDS: [&str; 6] =
    ["VERA", "SHIELD", "REPELLENT", "MOSQUITO", "SPRAY", "BUG"];

/// Configuration for [`BluetoothService`](crate::BluetoothService).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceConfig {
    /// How long a scan listens for advertisements.
    pub scan_timeout: Duration,
    /// Upper-case name fragments that mark a relevant device.
    pub name_keywords: Vec<String>,
    /// Advertised services that mark a relevant device.
    pub target_service_uuids: Vec<Uuid>,
    /// Signal strength threshold (dBm, exclusive) for the proximity fallback.
    pub min_rssi: i16,
    /// Intensity used by [`BluetoothService::send_default_spray_command`](crate::BluetoothService::send_default_spray_command).
    pub default_spray_intensity: u8,
    /// Number of connection attempts before giving up.
    pub connect_attempts: u32,
    /// Delay between connection attempts.
    pub reconnect_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            name_keywords: DEFAULT_NAME_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            target_service_uuids: TARGET_SERVICE_UUIDS.to_vec(),
            min_rssi: DEFAULT_MIN_RSSI,
            default_spray_intensity: DEFAULT_SPRAY_INTENSITY,
            connect_attempts: 1,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl ServiceConfig {
    /// Set the scan duration.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Replace the name keywords. Keywords are stored upper-cased.
    pub fn with_name_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.name_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_uppercase())
            .collect();
        self
    }

    /// Replace the target service UUIDs.
    pub fn with_target_service_uuids(mut self, uuids: impl IntoIterator<Item = Uuid>) -> Self {
        self.target_service_uuids = uuids.into_iter().collect();
        self
    }

    /// Set the proximity RSSI threshold.
    pub fn with_min_rssi(mut self, rssi: i16) -> Self {
        self.min_rssi = rssi;
        self
    }

    /// Set the default spray intensity.
    pub fn with_default_spray_intensity(mut self, intensity: u8) -> Self {
        self.default_spray_intensity = intensity;
        self
    }

    /// Set the connection retry parameters.
    pub fn with_connect_attempts(mut self, attempts: u32, delay: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.reconnect_delay = delay;
        self
    }
}
