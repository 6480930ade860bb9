// Connectivity level classification

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Proven connectivity of an interface, from "device absent" up to
/// "unrestricted access". Serialized as its integer code (-1..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum Level {
    /// Device not present at all.
    Offline = -1,
    /// Device listed by discovery, no proven connectivity.
    DevicePresent = 0,
    /// DNS resolves but no packets come back.
    DnsOnly = 1,
    /// The whitelisted target answers; the open internet may not.
    WhitelistedReachable = 2,
    /// The non-whitelisted target answers too.
    FullAccess = 3,
}

impl Level {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Level::Offline),
            0 => Some(Level::DevicePresent),
            1 => Some(Level::DnsOnly),
            2 => Some(Level::WhitelistedReachable),
            3 => Some(Level::FullAccess),
            _ => None,
        }
    }

    /// One step toward availability; saturates at `FullAccess`.
    pub fn promote(self) -> Self {
        Level::from_i8(self.as_i8() + 1).unwrap_or(Level::FullAccess)
    }

    /// One step away from availability; saturates at `Offline`.
    pub fn demote(self) -> Self {
        Level::from_i8(self.as_i8() - 1).unwrap_or(Level::Offline)
    }

    /// Human-readable status label for presentation consumers.
    pub fn label(self) -> &'static str {
        match self {
            Level::Offline => "Disconnected",
            Level::DevicePresent => "No Internet connection",
            Level::DnsOnly => "DNS only",
            Level::WhitelistedReachable => "Whitelisted",
            Level::FullAccess => "Full access",
        }
    }

    /// Display color matching the status label.
    pub fn color(self) -> &'static str {
        match self {
            Level::Offline => "gray",
            Level::DevicePresent | Level::DnsOnly => "red",
            Level::WhitelistedReachable => "orange",
            Level::FullAccess => "green",
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i8::deserialize(deserializer)?;
        Level::from_i8(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid level code {code}")))
    }
}
