//! The probe endpoint: where a client sends its liveness probes.
//!
//! A [`ProbeEndpoint`] is validated once at startup and never changes
//! afterwards.  Validation enforces two invariants:
//!
//! 1. The host resolves to at least one IP address (a literal IP always does).
//! 2. The port is in `1..=65535`.
//!
//! Both are configuration errors: the client refuses to start rather than
//! probing an address that can never answer and shutting the machine down
//! after the timeout.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};

use thiserror::Error;

use crate::protocol::messages::{STATUS_PATH, VERIFY_PATH};

/// Error type for endpoint validation.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The host name did not resolve to any address.
    #[error("specified host '{host}' doesn't exist")]
    UnknownHost {
        host: String,
        #[source]
        source: Option<std::io::Error>,
    },
    /// The port is outside `1..=65535`.
    #[error("invalid port {0}; must be between 1 and 65535")]
    InvalidPort(u32),
}

/// Transport scheme used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the URL scheme string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// A validated, immutable probe target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEndpoint {
    host: String,
    port: u16,
    scheme: Scheme,
}

impl ProbeEndpoint {
    /// Validates `host` and `port` and builds the endpoint.
    ///
    /// A literal IP address is normalised to its canonical text form; any
    /// other host is resolved once to prove it exists, but the *name* is kept
    /// so TLS certificate checks and later DNS changes keep working.
    ///
    /// # Errors
    ///
    /// - [`EndpointError::InvalidPort`] if `port` is 0 or above 65535.
    /// - [`EndpointError::UnknownHost`] if `host` resolves to no address.
    pub fn new(host: &str, port: u32, scheme: Scheme) -> Result<Self, EndpointError> {
        let port = match u16::try_from(port) {
            Ok(p) if p != 0 => p,
            _ => return Err(EndpointError::InvalidPort(port)),
        };

        let host = host.trim();
        if let Ok(ip) = host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
            return Ok(Self {
                host: ip.to_string(),
                port,
                scheme,
            });
        }

        if host.is_empty() {
            return Err(EndpointError::UnknownHost {
                host: host.to_string(),
                source: None,
            });
        }

        match (host, port).to_socket_addrs().map(|mut addrs| addrs.next().is_some()) {
            Ok(true) => Ok(Self {
                host: host.to_string(),
                port,
                scheme,
            }),
            Ok(false) => Err(EndpointError::UnknownHost {
                host: host.to_string(),
                source: None,
            }),
            Err(e) => Err(EndpointError::UnknownHost {
                host: host.to_string(),
                source: Some(e),
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Base URL without a path, e.g. `http://10.0.0.2:10101`.
    pub fn base_url(&self) -> String {
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]", self.host),
            _ => self.host.clone(),
        };
        format!("{}://{}:{}", self.scheme.as_str(), host, self.port)
    }

    /// URL of the liveness probe endpoint.
    pub fn status_url(&self) -> String {
        format!("{}{}", self.base_url(), STATUS_PATH)
    }

    /// URL of the verification report endpoint.
    pub fn verify_url(&self) -> String {
        format!("{}{}", self.base_url(), VERIFY_PATH)
    }
}

impl fmt::Display for ProbeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
