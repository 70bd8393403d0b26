//! Data structures for device data.
//!
//! This module contains the records describing discovered and connected
//! devices, decoded telemetry, and signal strength classification.

pub mod device;
pub mod signal;
pub mod telemetry;

pub use device::{ConnectedDevice, DiscoveredDevice};
pub use signal::{BadgeColor, SignalStrength};
pub use telemetry::{DeviceData, DeviceMode, ScheduledTime};
