//! Signal strength classification.

/// Coarse signal quality shown next to a discovered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalStrength {
    /// Above -50 dBm.
    Excellent,
    /// Above -70 dBm.
    Good,
    /// -70 dBm or below.
    Weak,
    /// No reading.
    #[default]
    Unknown,
}

/// Badge colour for a signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BadgeColor {
    /// Strong signal.
    Green,
    /// Usable signal.
    Yellow,
    /// Weak signal.
    Red,
    /// Unknown signal.
    Gray,
}

impl SignalStrength {
    /// Classify an RSSI reading.
    ///
    /// A reading of exactly 0 dBm is what platforms report when no
    /// measurement exists, so it is treated as unknown.
    pub fn from_rssi(rssi: Option<i16>) -> Self {
        match rssi {
            None | Some(0) => Self::Unknown,
            Some(r) if r > -50 => Self::Excellent,
            Some(r) if r > -70 => Self::Good,
            Some(_) => Self::Weak,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Weak => "Weak",
            Self::Unknown => "Unknown",
        }
    }

    /// Badge colour.
    pub fn color(&self) -> BadgeColor {
        match self {
            Self::Excellent => BadgeColor::Green,
            Self::Good => BadgeColor::Yellow,
            Self::Weak => BadgeColor::Red,
            Self::Unknown => BadgeColor::Gray,
        }
    }
}

impl std::fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rssi_thresholds() {
        assert_eq!(SignalStrength::from_rssi(None), SignalStrength::Unknown);
        assert_eq!(SignalStrength::from_rssi(Some(0)), SignalStrength::Unknown);
        assert_eq!(SignalStrength::from_rssi(Some(-30)), SignalStrength::Excellent);
        assert_eq!(SignalStrength::from_rssi(Some(-49)), SignalStrength::Excellent);
        assert_eq!(SignalStrength::from_rssi(Some(-50)), SignalStrength::Good);
        assert_eq!(SignalStrength::from_rssi(Some(-69)), SignalStrength::Good);
        assert_eq!(SignalStrength::from_rssi(Some(-70)), SignalStrength::Weak);
        assert_eq!(SignalStrength::from_rssi(Some(-95)), SignalStrength::Weak);
    }

    #[test]
    fn test_labels_and_colors() {
        assert_eq!(SignalStrength::Excellent.to_string(), "Excellent");
        assert_eq!(SignalStrength::Unknown.label(), "Unknown");
        assert_eq!(SignalStrength::Good.color(), BadgeColor::Yellow);
        assert_eq!(SignalStrength::Weak.color(), BadgeColor::Red);
        assert_eq!(SignalStrength::Unknown.color(), BadgeColor::Gray);
    }
}
