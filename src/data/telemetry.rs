//! Device telemetry data structures.
//!
//! Contains the record decoded from the repellent's status, battery and
//! schedule characteristics.

use chrono::{DateTime, Utc};

/// Operating mode of the repellent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceMode {
    /// Sprays on its own schedule.
    #[default]
    Auto,
    /// Sprays only on command.
    Manual,
}

impl DeviceMode {
    /// Create from the raw status byte. Only `1` means auto.
    pub fn from_raw(raw: u8) -> Self {
        if raw == 1 {
            Self::Auto
        } else {
            Self::Manual
        }
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A time of day at which the device sprays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledTime {
    hour: u8,
    minute: u8,
}

impl ScheduledTime {
    /// Create a scheduled time, or `None` if the hour or minute is out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Hour of day (0-23).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl std::fmt::Display for ScheduledTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Telemetry read from a repellent device.
///
/// Every field is optional: a characteristic that could not be read leaves
/// its fields unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceData {
    /// Battery charge in percent.
    pub battery_level: Option<u8>,
    /// Configured spray intensity.
    pub spray_intensity: Option<u8>,
    /// Whether the device is currently active.
    pub is_active: Option<bool>,
    /// Scheduled spray times.
    pub scheduled_times: Option<Vec<ScheduledTime>>,
    /// When the last spray command was accepted.
    pub last_spray_time: Option<DateTime<Utc>>,
    /// Total sprays reported by the device.
    pub spray_count: Option<u16>,
    /// Operating mode.
    pub device_mode: Option<DeviceMode>,
    /// Firmware revision string.
    pub firmware_version: Option<String>,
}

impl DeviceData {
    /// Stand-in values shown while no device is connected.
    pub fn placeholder() -> Self {
        Self {
            battery_level: Some(85),
            spray_intensity: Some(50),
            is_active: Some(false),
            scheduled_times: Some(
                [(8, 0), (20, 0)]
                    .into_iter()
                    .filter_map(|(h, m)| ScheduledTime::new(h, m))
                    .collect(),
            ),
            last_spray_time: None,
            spray_count: Some(24),
            device_mode: Some(DeviceMode::Auto),
            firmware_version: Some("1.2.1".to_string()),
        }
    }

    /// Overlay the fields present in `other` onto this record.
    pub fn merge(&mut self, other: DeviceData) {
        if other.battery_level.is_some() {
            self.battery_level = other.battery_level;
        }
        if other.spray_intensity.is_some() {
            self.spray_intensity = other.spray_intensity;
        }
        if other.is_active.is_some() {
            self.is_active = other.is_active;
        }
        if other.scheduled_times.is_some() {
            self.scheduled_times = other.scheduled_times;
        }
        if other.last_spray_time.is_some() {
            self.last_spray_time = other.last_spray_time;
        }
        if other.spray_count.is_some() {
            self.spray_count = other.spray_count;
        }
        if other.device_mode.is_some() {
            self.device_mode = other.device_mode;
        }
        if other.firmware_version.is_some() {
            self.firmware_version = other.firmware_version;
        }
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Scheduled times formatted as `HH:MM`.
    pub fn scheduled_time_strings(&self) -> Vec<String> {
        self.scheduled_times
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}
