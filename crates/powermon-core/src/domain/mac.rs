//! Hardware (MAC) address parsing and canonical formatting.
//!
//! A [`MacAddress`] is always 6 octets.  Three textual forms are accepted:
//!
//! | Form              | Example             |
//! |-------------------|---------------------|
//! | colon separated   | `AA:bb:CC:dd:EE:ff` |
//! | hyphen separated  | `aa-bb-cc-dd-ee-ff` |
//! | dotted (Cisco)    | `aabb.ccdd.eeff`    |
//!
//! The canonical form produced by `Display` is lower-case and colon separated.
//! Two addresses that differ only in notation compare equal, which is what
//! lets the server deduplicate its target set and match verification reports
//! regardless of how a client formats its addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when a string is not a valid 6-octet hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hardware address '{input}'")]
pub struct MacParseError {
    /// The rejected input, verbatim.
    pub input: String,
}

/// A 48-bit IEEE 802 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates an address from raw octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns `true` for `00:00:00:00:00:00`, which loopback and some
    /// virtual interfaces report.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 6]
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacParseError {
            input: s.to_string(),
        };

        let hex_groups: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else if s.contains('.') {
            // Dotted form: three groups of four hex digits.
            let groups: Vec<&str> = s.split('.').collect();
            if groups.len() != 3 || groups.iter().any(|g| g.len() != 4 || !g.is_ascii()) {
                return Err(err());
            }
            groups.iter().flat_map(|g| [&g[..2], &g[2..]]).collect()
        } else {
            return Err(err());
        };

        if hex_groups.len() != 6 {
            return Err(err());
        }

        let mut octets = [0u8; 6];
        for (slot, group) in octets.iter_mut().zip(&hex_groups) {
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err());
            }
            *slot = u8::from_str_radix(group, 16).map_err(|_| err())?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
