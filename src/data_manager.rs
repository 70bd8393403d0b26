//! Telemetry retrieval and caching.
//!
//! Reads the battery, status, schedule and firmware characteristics of the
//! connected device and keeps the merged result.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::ble::characteristics::GattClient;
use crate::ble::uuids::*;
use crate::data::DeviceData;
use crate::error::Result;
use crate::protocol::{parse_battery_level, parse_firmware_revision, parse_schedule, DeviceStatus};

/// Reads device telemetry and caches the last known values.
#[derive(Debug, Default)]
pub struct DataManager {
    device_data: RwLock<DeviceData>,
}

impl DataManager {
    /// Create an empty data manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all telemetry characteristics and merge them into the cache.
    ///
    /// Each characteristic is read on its own. One that cannot be read or
    /// parsed leaves its fields untouched in the cached record.
    pub async fn read_device_data(&self, gatt: &dyn GattClient) -> DeviceData {
        let mut fresh = DeviceData::default();

        match read_with(gatt, BATTERY_SERVICE_UUID, BATTERY_LEVEL_UUID, parse_battery_level).await
        {
            Ok(level) => fresh.battery_level = Some(level),
            Err(e) => debug!("Battery level not available: {}", e),
        }

        match read_with(gatt, REPELLENT_SERVICE_UUID, DEVICE_STATUS_UUID, DeviceStatus::parse).await
        {
            Ok(status) => {
                fresh.spray_intensity = Some(status.spray_intensity);
                fresh.is_active = Some(status.is_active);
                fresh.device_mode = Some(status.mode);
                fresh.spray_count = Some(status.spray_count);
            }
            Err(e) => debug!("Device status not available: {}", e),
        }

        match read_with(gatt, REPELLENT_SERVICE_UUID, SCHEDULE_DATA_UUID, parse_schedule).await {
            Ok(times) => fresh.scheduled_times = Some(times),
            Err(e) => debug!("Schedule data not available: {}", e),
        }

        match read_with(
            gatt,
            DEVICE_INFO_SERVICE_UUID,
            FIRMWARE_REVISION_UUID,
            parse_firmware_revision,
        )
        .await
        {
            Ok(version) => fresh.firmware_version = Some(version),
            Err(e) => debug!("Firmware revision not available: {}", e),
        }

        let mut cached = self.device_data.write();
        cached.merge(fresh);
        cached.clone()
    }

    /// Get the cached telemetry.
    pub fn device_data(&self) -> DeviceData {
        self.device_data.read().clone()
    }

    /// Stand-in telemetry for when no device is connected.
    pub fn placeholder_data(&self) -> DeviceData {
        DeviceData::placeholder()
    }

    /// Forget the cached telemetry.
    pub fn clear_device_data(&self) {
        *self.device_data.write() = DeviceData::default();
    }

    /// Record when a spray command was accepted.
    pub fn record_spray(&self, at: DateTime<Utc>) {
        self.device_data.write().last_spray_time = Some(at);
    }
}

async fn read_with<T>(
    gatt: &dyn GattClient,
    service: uuid::Uuid,
    characteristic: uuid::Uuid,
    parse: impl FnOnce(&[u8]) -> Result<T>,
) -> Result<T> {
    let data = gatt.read(service, characteristic).await?;
    parse(&data)
}
