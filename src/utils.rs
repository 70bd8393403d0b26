//! Utility functions for the vera-shield-ble crate.

/// Return the last `count` characters of a device identifier.
///
/// Identifiers shorter than `count` are returned whole.
///
/// # Example
///
/// ```
/// use vera_shield_ble::id_suffix;
///
/// assert_eq!(id_suffix("AA:BB:CC:DD:EE:FF", 4), "E:FF");
/// assert_eq!(id_suffix("abc", 8), "abc");
/// ```
pub fn id_suffix(identifier: &str, count: usize) -> &str {
    let len = identifier.chars().count();
    if len <= count {
        return identifier;
    }

    match identifier.char_indices().nth(len - count) {
        Some((start, _)) => &identifier[start..],
        None => identifier,
    }
}

/// Fallback display name for a peripheral that advertises no name.
#[inline]
pub fn fallback_device_name(identifier: &str) -> String {
    format!("Device {}", id_suffix(identifier, 4))
}

/// Display name recorded for a peripheral once connected.
#[inline]
pub fn connected_device_name(identifier: &str) -> String {
    format!("Connected Device {}", id_suffix(identifier, 4))
}
