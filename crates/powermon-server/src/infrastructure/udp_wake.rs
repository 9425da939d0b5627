//! UDP broadcast implementation of [`WakePacketSender`].
//!
//! # How Wake-on-LAN reaches a sleeping machine (for beginners)
//!
//! A powered-off machine has no IP address, so the packet cannot be routed
//! to it.  Instead it is broadcast to every device on the local segment
//! (`255.255.255.255` by default).  The sleeping network card inspects every
//! frame and powers the machine on when it sees its own hardware address
//! repeated in a magic packet.
//!
//! Each send opens a fresh ephemeral socket with `SO_BROADCAST` set.  Sends
//! happen at most once per target every tick, so there is nothing to gain
//! from keeping a socket open between rounds.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use powermon_core::{MacAddress, MagicPacket};
use tracing::debug;

use crate::application::wake_dispatcher::{WakePacketSender, WakeSendError};

/// Sends magic packets to a fixed broadcast destination.
#[derive(Debug, Clone, Copy)]
pub struct UdpWakeSender {
    destination: SocketAddr,
}

impl Default for UdpWakeSender {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::BROADCAST), 9)
    }
}

impl UdpWakeSender {
    pub fn new(broadcast: IpAddr, port: u16) -> Self {
        Self {
            destination: SocketAddr::new(broadcast, port),
        }
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl WakePacketSender for UdpWakeSender {
    fn send_wake(&self, mac: &MacAddress) -> Result<(), WakeSendError> {
        let bind: SocketAddr = match self.destination {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (std::net::Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).map_err(WakeSendError::Socket)?;
        socket.set_broadcast(true).map_err(WakeSendError::Socket)?;

        let packet = MagicPacket::new(mac);
        socket
            .send_to(packet.as_bytes(), self.destination)
            .map_err(|source| WakeSendError::Send {
                target: mac.to_string(),
                source,
            })?;
        debug!("magic packet for {mac} sent to {}", self.destination);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_destination_is_limited_broadcast_port_9() {
        assert_eq!(
            UdpWakeSender::default().destination(),
            "255.255.255.255:9".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_send_wake_delivers_magic_packet() {
        // Arrange: a loopback listener stands in for the broadcast domain
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let sender = UdpWakeSender::new(addr.ip(), addr.port());
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();

        // Act
        sender.send_wake(&mac).unwrap();

        // Assert
        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], MagicPacket::new(&mac).as_bytes());
    }
}
