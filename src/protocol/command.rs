//! Commands written to the repellent.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Opcode of the spray command.
pub const SPRAY_OPCODE: u8 = 0x01;

/// Highest accepted spray intensity.
pub const MAX_SPRAY_INTENSITY: u8 = 100;

/// A request to spray once at the given intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprayCommand {
    intensity: u8,
}

impl SprayCommand {
    /// Create a spray command. Intensity must be 0-100.
    pub fn new(intensity: u8) -> Result<Self> {
        if intensity > MAX_SPRAY_INTENSITY {
            return Err(Error::InvalidParameter {
                name: "intensity".to_string(),
                value: intensity.to_string(),
            });
        }
        Ok(Self { intensity })
    }

    /// Spray intensity.
    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    /// Encode as `[opcode, intensity]`.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(SPRAY_OPCODE);
        buf.put_u8(self.intensity);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_spray_command() {
        let command = SprayCommand::new(50).unwrap();
        assert_eq!(&command.encode()[..], &[0x01, 50]);
        assert_eq!(&SprayCommand::new(0).unwrap().encode()[..], &[0x01, 0]);
        assert_eq!(&SprayCommand::new(100).unwrap().encode()[..], &[0x01, 100]);
        assert_eq!(command.intensity(), 50);
    }

    #[test]
    fn test_intensity_out_of_range() {
        let err = SprayCommand::new(101).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "intensity"));
    }
}
