// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # vera-shield-ble
//!
//! A cross-platform Rust library for pairing with and querying VeraShield
//! mosquito repellent devices via Bluetooth Low Energy.
//!
//! ## Features
//!
//! - **Device Discovery**: Scan for nearby repellents by name keyword,
//!   advertised service, or proximity
//! - **Pairing**: Connect to a single device and track its connection
//! - **Telemetry**: Battery level, spray settings, spray count and schedule
//! - **Spray Control**: Trigger a spray at a chosen intensity
//! - **Pairing Panel**: Headless state for a "Pair Device" screen
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vera_shield_ble::{BluetoothService, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let service = BluetoothService::instance();
//!
//!     let devices = service.scan_for_devices(Duration::from_secs(10)).await?;
//!     if let Some(device) = devices.first() {
//!         service.connect_to_device(&device.device_id).await?;
//!
//!         let data = service.device_data();
//!         println!("Battery: {:?}%", data.battery_level);
//!
//!         service.send_spray_command(50).await?;
//!         service.disconnect_device().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod data_manager;
pub mod error;
pub mod pairing;
pub mod protocol;
pub mod service;
pub mod utils;

// Re-exports for convenience
pub use config::ServiceConfig;
pub use data_manager::DataManager;
pub use error::{Error, Result};
pub use pairing::{PairingBackend, PairingPanel, PanelView, Toast, ToastVariant};
pub use service::BluetoothService;
pub use utils::id_suffix;

// Re-export commonly used types from submodules
pub use ble::connection::ConnectionState;
pub use data::{
    BadgeColor, ConnectedDevice, DeviceData, DeviceMode, DiscoveredDevice, ScheduledTime,
    SignalStrength,
};
