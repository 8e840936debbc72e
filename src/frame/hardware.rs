use serde::{Deserialize, Serialize};

/// Bitmask of the peripherals a node detected at boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hardware(u8);

impl Hardware {
    pub const BME280: Self = Self(1 << 0);
    pub const CCS811: Self = Self(1 << 1);
    pub const RTC: Self = Self(1 << 2);
    pub const SD: Self = Self(1 << 3);
    pub const GPS: Self = Self(1 << 4);

    const NAMED: [(Self, &'static str); 5] = [
        (Self::BME280, "BME280"),
        (Self::CCS811, "CCS811"),
        (Self::RTC, "RTC"),
        (Self::SD, "SD"),
        (Self::GPS, "GPS"),
    ];

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the present peripherals, in bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::fmt::Display for Hardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.names().join(","))
    }
}
