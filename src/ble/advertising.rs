//! Advertisement filtering.
//!
//! Decides which advertising peripherals are VeraShield-compatible and
//! collects them without duplicates.

use std::collections::HashSet;

use btleplug::api::PeripheralProperties;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::data::DiscoveredDevice;

/// The advertisement fields used for relevance filtering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Advertisement {
    /// Platform peripheral identifier.
    pub device_id: String,
    /// Advertised local name.
    pub local_name: Option<String>,
    /// Advertised service UUIDs.
    pub services: Vec<Uuid>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl Advertisement {
    /// Build from btleplug peripheral properties.
    pub fn from_properties(device_id: impl Into<String>, properties: &PeripheralProperties) -> Self {
        Self {
            device_id: device_id.into(),
            local_name: properties.local_name.clone(),
            services: properties.services.clone(),
            rssi: properties.rssi,
        }
    }

    /// Convert into a discovered device record.
    pub fn into_device(self) -> DiscoveredDevice {
        DiscoveredDevice::new(
            self.device_id,
            self.local_name.as_deref(),
            self.services,
            self.rssi,
        )
    }
}

/// Heuristics selecting repellent devices out of all nearby advertisers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    keywords: Vec<String>,
    target_services: Vec<Uuid>,
    min_rssi: i16,
}

impl DeviceFilter {
    /// Create a filter from explicit parameters. Keywords are upper-cased.
    pub fn new(keywords: &[String], target_services: &[Uuid], min_rssi: i16) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_uppercase()).collect(),
            target_services: target_services.to_vec(),
            min_rssi,
        }
    }

    /// Create a filter from the service configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            &config.name_keywords,
            &config.target_service_uuids,
            config.min_rssi,
        )
    }

    /// Check whether an advertisement belongs to a compatible device.
    ///
    /// A keyword in the name wins. Otherwise a device that advertises
    /// services is judged on those services alone. Only devices with neither
    /// fall back to signal strength.
    pub fn is_relevant(&self, advertisement: &Advertisement) -> bool {
        if let Some(name) = advertisement.local_name.as_deref() {
            let upper = name.to_uppercase();
            if self.keywords.iter().any(|k| upper.contains(k.as_str())) {
                return true;
            }
        }

        if !advertisement.services.is_empty() {
            return advertisement
                .services
                .iter()
                .any(|uuid| self.target_services.contains(uuid));
        }

        matches!(advertisement.rssi, Some(rssi) if rssi != 0 && rssi > self.min_rssi)
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

/// Discovered devices in first-seen order, unique by identifier.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredDevices {
    seen: HashSet<String>,
    devices: Vec<DiscoveredDevice>,
}

impl DiscoveredDevices {
    /// Record a device. Returns `false` if the identifier was already seen.
    pub fn insert(&mut self, device: DiscoveredDevice) -> bool {
        if !self.seen.insert(device.device_id.clone()) {
            return false;
        }
        self.devices.push(device);
        true
    }

    /// Number of unique devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Take the collected devices.
    pub fn into_vec(self) -> Vec<DiscoveredDevice> {
        self.devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::{BATTERY_SERVICE_UUID, DEVICE_STATUS_UUID, REPELLENT_SERVICE_UUID};

    fn advertisement(name: Option<&str>, services: Vec<Uuid>, rssi: Option<i16>) -> Advertisement {
        Advertisement {
            device_id: "AA:BB:CC:DD:EE:FF".to_string(),
            local_name: name.map(str::to_string),
            services,
            rssi,
        }
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let filter = DeviceFilter::default();
        assert!(filter.is_relevant(&advertisement(Some("VeraShield Pro"), vec![], None)));
        assert!(filter.is_relevant(&advertisement(Some("my bug zapper"), vec![], Some(-99))));
        assert!(filter.is_relevant(&advertisement(
            Some("Mosquito-X"),
            vec![DEVICE_STATUS_UUID],
            None
        )));
    }

    #[test]
    fn test_service_match() {
        let filter = DeviceFilter::default();
        assert!(filter.is_relevant(&advertisement(
            Some("Headphones"),
            vec![DEVICE_STATUS_UUID, BATTERY_SERVICE_UUID],
            Some(-90)
        )));
        assert!(filter.is_relevant(&advertisement(None, vec![REPELLENT_SERVICE_UUID], None)));
    }

    #[test]
    fn test_unrelated_services_skip_rssi_fallback() {
        let filter = DeviceFilter::default();
        assert!(!filter.is_relevant(&advertisement(
            Some("Headphones"),
            vec![DEVICE_STATUS_UUID],
            Some(-30)
        )));
    }

    #[test]
    fn test_rssi_fallback() {
        let filter = DeviceFilter::default();
        assert!(filter.is_relevant(&advertisement(None, vec![], Some(-59))));
        assert!(!filter.is_relevant(&advertisement(None, vec![], Some(-60))));
        assert!(!filter.is_relevant(&advertisement(None, vec![], Some(0))));
        assert!(!filter.is_relevant(&advertisement(None, vec![], None)));
        assert!(filter.is_relevant(&advertisement(Some("Watch"), vec![], Some(-40))));
    }

    #[test]
    fn test_custom_filter() {
        let filter = DeviceFilter::new(&["zap".to_string()], &[], -80);
        assert!(filter.is_relevant(&advertisement(Some("ZAPPER"), vec![], None)));
        assert!(!filter.is_relevant(&advertisement(Some("VeraShield"), vec![], None)));
        assert!(filter.is_relevant(&advertisement(None, vec![], Some(-75))));
    }

    #[test]
    fn test_into_device_uses_fallback_name() {
        let device = advertisement(None, vec![], Some(-50)).into_device();
        assert_eq!(device.name, "Device E:FF");
        assert_eq!(device.rssi, Some(-50));
    }

    #[test]
    fn test_discovered_devices_dedup() {
        let mut devices = DiscoveredDevices::default();
        assert!(devices.insert(DiscoveredDevice::new("1", Some("VERA"), vec![], Some(-40))));
        assert!(devices.insert(DiscoveredDevice::new("2", Some("BUG"), vec![], None)));
        assert!(!devices.insert(DiscoveredDevice::new("1", Some("VERA"), vec![], Some(-80))));
        assert_eq!(devices.len(), 2);

        let devices = devices.into_vec();
        assert_eq!(devices[0].device_id, "1");
        assert_eq!(devices[0].rssi, Some(-40));
        assert_eq!(devices[1].device_id, "2");
    }
}
