//! Protocol module for parsing and constructing payloads.
//!
//! This module contains the implementations for:
//! - Battery level, device status and firmware revision parsing
//! - Schedule parsing
//! - Spray command encoding

pub mod command;
pub mod schedule;
pub mod status;

pub use command::SprayCommand;
pub use schedule::parse_schedule;
pub use status::{parse_battery_level, parse_firmware_revision, DeviceStatus};
