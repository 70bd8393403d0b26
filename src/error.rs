//! Error types for the vera-shield-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The requested device is not known to the adapter.
    #[error("Device not found: {identifier}")]
    DeviceNotFound {
        /// The identifier that was searched for.
        identifier: String,
    },

    /// Operation requires a connection but no device is connected.
    #[error("No device connected")]
    NotConnected,

    /// A scan is already running.
    #[error("Scan already in progress")]
    ScanInProgress,

    /// Scanning for devices failed.
    #[error("Device scan failed: {reason}")]
    ScanFailed {
        /// Description of why the scan failed.
        reason: String,
    },

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Failed to tear down the connection to the device.
    #[error("Disconnection failed: {reason}")]
    DisconnectFailed {
        /// Description of why the disconnect failed.
        reason: String,
    },

    /// A command could not be delivered to the device.
    #[error("Command failed: {reason}")]
    CommandFailed {
        /// Description of why the command failed.
        reason: String,
    },

    /// Invalid data was received from the device.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(Error::NotConnected.to_string(), "No device connected");
        assert_eq!(
            Error::InvalidParameter {
                name: "intensity".to_string(),
                value: "150".to_string(),
            }
            .to_string(),
            "Invalid parameter: intensity = 150"
        );
        assert_eq!(
            Error::ScanFailed {
                reason: "adapter gone".to_string()
            }
            .to_string(),
            "Device scan failed: adapter gone"
        );
    }
}
