//! Local network interface hardware addresses.
//!
//! Used for two things:
//!
//! - building the [`ClientIdentity`] attached to probes and verify reports;
//! - the `powermon mac` listing, which tells the operator which address to
//!   put in the server's wake list.
//!
//! On Linux every interface appears under `/sys/class/net/<name>/` with its
//! hardware address in the `address` file.  Other platforms go through the
//! operating system's interface table via `netdev`.  Interfaces without an
//! address (the loopback reports `00:00:00:00:00:00`, tunnels report nothing
//! or a non-Ethernet address) are skipped by both backends.

use std::path::{Path, PathBuf};

use powermon_core::{ClientIdentity, MacAddress};
use thiserror::Error;
use tracing::{debug, warn};

/// Default sysfs directory listing network interfaces.
pub const SYSFS_NET: &str = "/sys/class/net";

/// Error type for interface enumeration.
#[derive(Debug, Error)]
pub enum HardwareAddressError {
    #[error("failed to list network interfaces in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One interface with a usable hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub name: String,
    pub mac: MacAddress,
}

impl std::fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interface: {}\nMAC: {}\n", self.name, self.mac)
    }
}

/// Source of local interface addresses.
pub trait HardwareAddressSource {
    /// Lists interfaces that have a non-zero hardware address, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareAddressError`] if the interface list cannot be read.
    fn interfaces(&self) -> Result<Vec<InterfaceAddress>, HardwareAddressError>;
}

/// Drops zero addresses and sorts by interface name.
fn usable(found: impl IntoIterator<Item = InterfaceAddress>) -> Vec<InterfaceAddress> {
    let mut list: Vec<InterfaceAddress> = found
        .into_iter()
        .filter(|iface| {
            if iface.mac.is_zero() {
                debug!("interface {}: zero hardware address", iface.name);
            }
            !iface.mac.is_zero()
        })
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

/// Reads interfaces from a sysfs style directory tree.
#[derive(Debug, Clone)]
pub struct SysfsAddressSource {
    root: PathBuf,
}

impl Default for SysfsAddressSource {
    fn default() -> Self {
        Self::new(SYSFS_NET)
    }
}

impl SysfsAddressSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl HardwareAddressSource for SysfsAddressSource {
    fn interfaces(&self) -> Result<Vec<InterfaceAddress>, HardwareAddressError> {
        let io_err = |source| HardwareAddressError::Io {
            path: self.root.clone(),
            source,
        };

        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();

            // Entries without a readable address file are not Ethernet-like.
            let Ok(raw) = std::fs::read_to_string(entry.path().join("address")) else {
                debug!("interface {name}: no address file");
                continue;
            };
            match raw.trim().parse::<MacAddress>() {
                Ok(mac) => found.push(InterfaceAddress { name, mac }),
                Err(_) => debug!("interface {name}: unusable address '{}'", raw.trim()),
            }
        }

        Ok(usable(found))
    }
}

/// Reads interfaces from the operating system's interface table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetdevAddressSource;

impl HardwareAddressSource for NetdevAddressSource {
    fn interfaces(&self) -> Result<Vec<InterfaceAddress>, HardwareAddressError> {
        let found = netdev::get_interfaces().into_iter().filter_map(|iface| {
            let Some(addr) = iface.mac_addr else {
                debug!("interface {}: no hardware address", iface.name);
                return None;
            };
            Some(InterfaceAddress {
                name: iface.name,
                mac: MacAddress::new(addr.octets()),
            })
        });
        Ok(usable(found))
    }
}

/// Lists the interfaces of this machine: sysfs on Linux, the system
/// interface table elsewhere.
///
/// # Errors
///
/// [`HardwareAddressError::Io`] if sysfs cannot be read.
pub fn local_interfaces() -> Result<Vec<InterfaceAddress>, HardwareAddressError> {
    if cfg!(target_os = "linux") {
        SysfsAddressSource::default().interfaces()
    } else {
        NetdevAddressSource.interfaces()
    }
}

/// [`HardwareAddressSource`] for this machine, see [`local_interfaces`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalInterfaces;

impl HardwareAddressSource for LocalInterfaces {
    fn interfaces(&self) -> Result<Vec<InterfaceAddress>, HardwareAddressError> {
        local_interfaces()
    }
}

/// Builds the identity reported to the server.
///
/// Enumeration failures are logged and yield an identity without addresses:
/// probes still work, the server just cannot match this client to a target.
pub fn collect_identity(source: &dyn HardwareAddressSource, nickname: &str) -> ClientIdentity {
    let interfaces = match source.interfaces() {
        Ok(list) => list,
        Err(e) => {
            warn!("could not collect hardware addresses: {e}");
            Vec::new()
        }
    };
    ClientIdentity::new(nickname, interfaces.into_iter().map(|i| i.mac))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
