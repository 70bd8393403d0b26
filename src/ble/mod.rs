//! BLE communication module.
//!
//! This module provides low-level Bluetooth Low Energy functionality
//! for discovering and communicating with VeraShield repellent devices.

pub mod advertising;
pub mod characteristics;
pub mod connection;
pub mod radio;
pub mod scanner;
pub mod uuids;

pub use advertising::{Advertisement, DeviceFilter, DiscoveredDevices};
pub use characteristics::{CharacteristicHandler, GattClient};
pub use connection::{ConnectionEvent, ConnectionManager, ConnectionState};
pub use radio::{AdvertisementStream, DisconnectStream, Link, Radio};
pub use scanner::BleScanner;
pub use uuids::*;
