/// Fault reported by the CCS811 air-quality sensor through its status byte.
///
/// A status of `0` means the sensor is healthy and maps to no fault at all;
/// every other byte value maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SensorFault {
    #[error("ccs811: invalid ID")]
    InvalidId,

    #[error("ccs811: I2C error")]
    Bus,

    #[error("ccs811: internal error")]
    Internal,

    #[error("ccs811: generic error")]
    Generic,

    #[error("ccs811: unknown error (status {0})")]
    Unknown(u8),
}

impl SensorFault {
    /// Map a raw status byte to its fault. Total over all 256 values.
    #[must_use]
    pub const fn from_status(status: u8) -> Option<Self> {
        match status {
            0 => None,
            1 => Some(Self::InvalidId),
            2 => Some(Self::Bus),
            3 => Some(Self::Internal),
            4 => Some(Self::Generic),
            code => Some(Self::Unknown(code)),
        }
    }

    /// The status byte this fault was decoded from.
    #[must_use]
    pub const fn status(self) -> u8 {
        match self {
            Self::InvalidId => 1,
            Self::Bus => 2,
            Self::Internal => 3,
            Self::Generic => 4,
            Self::Unknown(code) => code,
        }
    }
}

/// Human-readable label for a status byte, as shown on the status page.
#[must_use]
pub const fn describe_status(status: u8) -> &'static str {
    match SensorFault::from_status(status) {
        None => "OK",
        Some(SensorFault::InvalidId) => "invalid ID",
        Some(SensorFault::Bus) => "I2C error",
        Some(SensorFault::Internal) => "internal error",
        Some(SensorFault::Generic) => "generic error",
        // The node reports 0xFF when the sensor never came up
        Some(SensorFault::Unknown(_)) => "unknown error or sensor is off",
    }
}
