//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants used for VeraShield device communication.

use uuid::Uuid;

// Repellent Service (VeraShield Custom)
/// Custom mosquito repellent service UUID.
pub const REPELLENT_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x1234_5678_1234_5678_9012_1234_5678_9abc);
/// Device status characteristic UUID (Read, Write).
///
/// Reads return the status block; writes carry spray commands.
pub const DEVICE_STATUS_UUID: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_9012_1234_5678_9abd);
/// Spray settings characteristic UUID. Reserved by the firmware, not used yet.
pub const SPRAY_SETTINGS_UUID: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_9012_1234_5678_9abe);
/// Schedule data characteristic UUID (Read).
pub const SCHEDULE_DATA_UUID: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_9012_1234_5678_9abf);

// Battery Service (Standard BLE)
/// Standard BLE Battery Service UUID.
pub const BATTERY_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180f_0000_1000_8000_00805f9b34fb);
/// Battery Level characteristic UUID.
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

// Device Information Service (Standard BLE)
/// Standard BLE Device Information Service UUID.
pub const DEVICE_INFO_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180a_0000_1000_8000_00805f9b34fb);
/// Firmware Revision characteristic UUID.
pub const FIRMWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a26_0000_1000_8000_00805f9b34fb);

/// Services whose presence in an advertisement marks a compatible device.
pub const TARGET_SERVICE_UUIDS: [Uuid; 3] = [
    REPELLENT_SERVICE_UUID,
    BATTERY_SERVICE_UUID,
    DEVICE_INFO_SERVICE_UUID,
];

/// Service carrying the spray command characteristic.
pub const SPRAY_COMMAND_SERVICE_UUID: Uuid = REPELLENT_SERVICE_UUID;
/// Characteristic the spray command is written to.
pub const SPRAY_COMMAND_CHARACTERISTIC_UUID: Uuid = DEVICE_STATUS_UUID;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            REPELLENT_SERVICE_UUID.to_string(),
            "12345678-1234-5678-9012-123456789abc"
        );
        assert_eq!(
            SCHEDULE_DATA_UUID.to_string(),
            "12345678-1234-5678-9012-123456789abf"
        );
        assert_eq!(
            BATTERY_LEVEL_UUID.to_string(),
            "00002a19-0000-1000-8000-00805f9b34fb"
        );
        assert!(DEVICE_INFO_SERVICE_UUID.to_string().contains("180a"));
    }

    #[test]
    fn test_uuids_parse_from_uppercase() {
        let parsed = Uuid::parse_str("0000180F-0000-1000-8000-00805F9B34FB").unwrap();
        assert_eq!(parsed, BATTERY_SERVICE_UUID);
    }

    #[test]
    fn test_spray_command_target() {
        assert_eq!(SPRAY_COMMAND_SERVICE_UUID, REPELLENT_SERVICE_UUID);
        assert_eq!(SPRAY_COMMAND_CHARACTERISTIC_UUID, DEVICE_STATUS_UUID);
    }
}
