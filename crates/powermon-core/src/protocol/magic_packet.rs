//! Wake-on-LAN magic packet encoding.
//!
//! A magic packet is 6 bytes of `0xFF` followed by the target's 6-byte
//! hardware address repeated 16 times, 102 bytes in total.  A network card
//! with Wake-on-LAN enabled scans every frame it receives for this pattern
//! while the machine is powered off; it does not care about the transport, so
//! the packet is simply sent as a UDP broadcast datagram (conventionally to
//! port 9, "discard").

use crate::domain::mac::MacAddress;

/// Number of times the hardware address is repeated after the sync stream.
const REPETITIONS: usize = 16;

/// Length of the `0xFF` synchronisation stream.
const SYNC_LEN: usize = 6;

/// Total size of an encoded magic packet.
pub const MAGIC_PACKET_LEN: usize = SYNC_LEN + REPETITIONS * 6;

/// An encoded Wake-on-LAN frame for one hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket {
    bytes: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    pub fn new(mac: &MacAddress) -> Self {
        let mut bytes = [0xFFu8; MAGIC_PACKET_LEN];
        let octets = mac.octets();
        for chunk in bytes[SYNC_LEN..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&octets);
        }
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
