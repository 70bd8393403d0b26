//! Status and battery payload parsing.
//!
//! Parses the battery level and device status characteristics.

use bytes::Buf;
use tracing::trace;

use crate::data::DeviceMode;
use crate::error::{Error, Result};

/// Parse the battery level characteristic (byte 0, percent).
pub fn parse_battery_level(data: &[u8]) -> Result<u8> {
    data.first().copied().ok_or_else(|| Error::InvalidData {
        context: "Battery level payload is empty".to_string(),
    })
}

/// Parsed device status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Configured spray intensity.
    pub spray_intensity: u8,
    /// Whether the device is active.
    pub is_active: bool,
    /// Operating mode.
    pub mode: DeviceMode,
    /// Total sprays performed.
    pub spray_count: u16,
}

impl DeviceStatus {
    /// Size of the status block.
    pub const SIZE: usize = 5;

    /// Parse the device status characteristic.
    ///
    /// Layout:
    /// - Byte 0: Spray intensity
    /// - Byte 1: Active flag (1 = active)
    /// - Byte 2: Mode (1 = auto, otherwise manual)
    /// - Bytes 3-4: Spray count (uint16_t little-endian)
    ///
    /// Trailing bytes are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidData {
                context: format!(
                    "Status data too short: {} bytes (need at least {})",
                    data.len(),
                    Self::SIZE
                ),
            });
        }

        trace!("Parsing device status: {:02X?}", data);

        let mut buf = data;
        let spray_intensity = buf.get_u8();
        let is_active = buf.get_u8() == 1;
        let mode = DeviceMode::from_raw(buf.get_u8());
        let spray_count = buf.get_u16_le();

        Ok(Self {
            spray_intensity,
            is_active,
            mode,
            spray_count,
        })
    }
}

/// Parse the firmware revision string, trimming trailing NULs and whitespace.
pub fn parse_firmware_revision(data: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(data).map_err(|_| Error::InvalidData {
        context: "Invalid UTF-8 in firmware revision".to_string(),
    })?;

    let trimmed = text.trim_end_matches('\0').trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidData {
            context: "Firmware revision is empty".to_string(),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_battery_level() {
        assert_eq!(parse_battery_level(&[72]).unwrap(), 72);
        assert_eq!(parse_battery_level(&[100, 0, 0]).unwrap(), 100);
        assert!(parse_battery_level(&[]).is_err());
    }

    #[test]
    fn test_parse_status() {
        let status = DeviceStatus::parse(&[60, 1, 1, 0x2C, 0x01]).unwrap();
        assert_eq!(status.spray_intensity, 60);
        assert!(status.is_active);
        assert_eq!(status.mode, DeviceMode::Auto);
        assert_eq!(status.spray_count, 300);
    }

    #[test]
    fn test_parse_status_flag_values() {
        let status = DeviceStatus::parse(&[0, 2, 0, 0xFF, 0xFF, 0xAA]).unwrap();
        assert!(!status.is_active);
        assert_eq!(status.mode, DeviceMode::Manual);
        assert_eq!(status.spray_count, u16::MAX);
    }

    #[test]
    fn test_parse_status_too_short() {
        let err = DeviceStatus::parse(&[60, 1, 1, 0x2C]).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_parse_firmware_revision() {
        assert_eq!(parse_firmware_revision(b"1.4.0\0\0").unwrap(), "1.4.0");
        assert_eq!(parse_firmware_revision(b" 2.0 ").unwrap(), "2.0");
        assert!(parse_firmware_revision(b"\0\0").is_err());
        assert!(parse_firmware_revision(&[0xFF, 0xFE]).is_err());
    }

    proptest! {
        #[test]
        fn status_parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            let parsed = DeviceStatus::parse(&data);
            prop_assert_eq!(parsed.is_ok(), data.len() >= DeviceStatus::SIZE);
        }
    }
}
