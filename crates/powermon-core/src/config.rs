//! TOML configuration file schema.
//!
//! Every command line option can also be given in an optional TOML file
//! passed with `--config`.  Values on the command line win over the file;
//! values in the file win over the built-in defaults.
//!
//! ```toml
//! [general]
//! verbose = true
//! logfile = "/var/log/powermon.log"
//! nickname = "office-nas"
//!
//! [pushover]
//! token = "a1b2c3"
//! users = ["u1", "u2"]
//!
//! [client]
//! host = "192.168.1.2"
//! timeout_secs = 120
//! verify = true
//!
//! [server]
//! wakelist = "/etc/powermon/wake.txt"
//! verify = true
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = "...")]` so that a file only needs
//! to mention what it changes, and a missing file behaves exactly like an
//! empty one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PowermonConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log at `info` instead of `warn`.
    #[serde(default)]
    pub verbose: bool,
    /// Append logs to this file instead of stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logfile: Option<PathBuf>,
    /// Name used in notifications and identity reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Pushover notification credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushoverConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Client (probe + shutdown) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Server host name or IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u32,
    /// Continuous failure window before the terminal action runs.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay between successful probes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Delay between failed probes.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Per-probe network timeout.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Probe over `https`.
    #[serde(default)]
    pub tls: bool,
    /// Attach the client identity to every probe.
    #[serde(default)]
    pub verify: bool,
    /// Run the shutdown command through `sudo`.
    #[serde(default)]
    pub sudo: bool,
    /// Custom command to run instead of shutting down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<String>,
}

/// Server (listener + wake dispatch) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u32,
    /// Hardware addresses to wake at startup.
    #[serde(default)]
    pub wake: Vec<String>,
    /// File with one hardware address per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wakelist: Option<PathBuf>,
    /// Keep waking until every target verifies.
    #[serde(default)]
    pub verify: bool,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Number of wake rounds when `verify` is off.
    #[serde(default = "default_attempt_budget")]
    pub attempt_budget: u32,
    /// Destination address of magic packets.
    #[serde(default = "default_broadcast")]
    pub broadcast: String,
    /// Destination UDP port of magic packets.
    #[serde(default = "default_wol_port")]
    pub wol_port: u16,
}

// ── Default helpers ───────────────────────────────────────────────────────────

pub fn default_port() -> u32 {
    10101
}
pub fn default_timeout_secs() -> u64 {
    60
}
pub fn default_interval_secs() -> u64 {
    60
}
pub fn default_retry_interval_secs() -> u64 {
    3
}
pub fn default_probe_timeout_secs() -> u64 {
    2
}
pub fn default_bind() -> String {
    "0.0.0.0".to_string()
}
pub fn default_tick_interval_secs() -> u64 {
    15
}
pub fn default_attempt_budget() -> u32 {
    10
}
pub fn default_broadcast() -> String {
    "255.255.255.255".to_string()
}
pub fn default_wol_port() -> u16 {
    9
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            tls: false,
            verify: false,
            sudo: false,
            on_timeout: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            wake: Vec::new(),
            wakelist: None,
            verify: false,
            tick_interval_secs: default_tick_interval_secs(),
            attempt_budget: default_attempt_budget(),
            broadcast: default_broadcast(),
            wol_port: default_wol_port(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Checks the timing values the probe loop relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the probe timeout is zero or the
    /// retry interval is not shorter than the probe interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "probe_timeout_secs",
                reason: "must be at least 1 second",
            });
        }
        if self.retry_interval_secs >= self.interval_secs {
            return Err(ConfigError::Invalid {
                field: "retry_interval_secs",
                reason: "must be shorter than interval_secs",
            });
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Checks the wake dispatch timing values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the tick interval or the attempt
    /// budget is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_interval_secs",
                reason: "must be at least 1 second",
            });
        }
        if self.attempt_budget == 0 {
            return Err(ConfigError::Invalid {
                field: "attempt_budget",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

// ── Load ──────────────────────────────────────────────────────────────────────

impl PowermonConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or mistyped values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`PowermonConfig::from_toml`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// As [`PowermonConfig::load`].
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        // Arrange / Act
        let cfg = PowermonConfig::from_toml("").unwrap();

        // Assert
        assert_eq!(cfg, PowermonConfig::default());
        assert_eq!(cfg.client.port, 10101);
        assert_eq!(cfg.client.retry_interval_secs, 3);
        assert_eq!(cfg.client.probe_timeout_secs, 2);
        assert_eq!(cfg.server.tick_interval_secs, 15);
        assert_eq!(cfg.server.attempt_budget, 10);
        assert_eq!(cfg.server.broadcast, "255.255.255.255");
        assert_eq!(cfg.server.wol_port, 9);
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let cfg = PowermonConfig::from_toml(
            r#"
            [client]
            host = "10.0.0.2"
            timeout_secs = 120

            [server]
            verify = true
            wake = ["aa:bb:cc:dd:ee:ff"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.client.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(cfg.client.timeout_secs, 120);
        assert_eq!(cfg.client.interval_secs, 60);
        assert!(cfg.server.verify);
        assert_eq!(cfg.server.wake.len(), 1);
        assert_eq!(cfg.server.port, 10101);
    }

    #[test]
    fn test_general_and_pushover_tables() {
        let cfg = PowermonConfig::from_toml(
            r#"
            [general]
            verbose = true
            nickname = "nas"

            [pushover]
            token = "app"
            users = ["u1"]
            "#,
        )
        .unwrap();

        assert!(cfg.general.verbose);
        assert_eq!(cfg.general.nickname.as_deref(), Some("nas"));
        assert_eq!(cfg.pushover.token.as_deref(), Some("app"));
        assert_eq!(cfg.pushover.users, vec!["u1".to_string()]);
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = PowermonConfig::from_toml("[client]\nport = \"ten\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut cfg = PowermonConfig::default();
        cfg.server.wakelist = Some(PathBuf::from("/etc/powermon/wake.txt"));

        let text = toml::to_string(&cfg).unwrap();
        let back = PowermonConfig::from_toml(&text).unwrap();

        assert_eq!(back, cfg);
    }

    #[test]
    fn test_load_optional_without_path_is_default() {
        assert_eq!(
            PowermonConfig::load_optional(None).unwrap(),
            PowermonConfig::default()
        );
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tick_interval_is_invalid() {
        // Arrange
        let cfg = PowermonConfig::from_toml("[server]\ntick_interval_secs = 0\n").unwrap();

        // Act
        let result = cfg.server.validate();

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "tick_interval_secs", .. })
        ));
    }

    #[test]
    fn test_zero_attempt_budget_is_invalid() {
        let cfg = ServerConfig {
            attempt_budget: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "attempt_budget", .. })
        ));
    }

    #[test]
    fn test_client_timing_constraints() {
        let zero_timeout = ClientConfig {
            probe_timeout_secs: 0,
            ..ClientConfig::default()
        };
        let slow_retry = ClientConfig {
            interval_secs: 10,
            retry_interval_secs: 10,
            ..ClientConfig::default()
        };

        assert!(matches!(
            zero_timeout.validate(),
            Err(ConfigError::Invalid { field: "probe_timeout_secs", .. })
        ));
        assert!(matches!(
            slow_retry.validate(),
            Err(ConfigError::Invalid { field: "retry_interval_secs", .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = PowermonConfig::load(Path::new("/nonexistent/powermon.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
