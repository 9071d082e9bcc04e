//! Address family of a range table.

use std::fmt;
use std::net::IpAddr;

/// Which of the two disjoint address spaces a record or query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AddressFamily {
    /// 32-bit address space
    #[default]
    V4 = 4,
    /// 128-bit address space
    V6 = 6,
}

impl AddressFamily {
    /// Parse a family name (case-insensitive).
    ///
    /// Accepts `v4`, `ipv4`, `4` and the IPv6 equivalents.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "4" | "v4" | "ipv4" => Some(AddressFamily::V4),
            "6" | "v6" | "ipv6" => Some(AddressFamily::V6),
            _ => None,
        }
    }

    /// Family of a parsed address.
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
