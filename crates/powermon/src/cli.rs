//! Command line definitions and their merge with the configuration file.
//!
//! Every option is optional on the command line so that a value from the
//! `--config` file can fill it in.  Precedence is:
//!
//! ```text
//! command line  >  config file  >  built-in default
//! ```
//!
//! Boolean flags can only switch a feature on: `--verify` on the command
//! line or `verify = true` in the file both enable it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use powermon_core::config::{ClientConfig, GeneralConfig, PushoverConfig, ServerConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Shut machines down when the power goes out and wake them when it comes back.
#[derive(Debug, Parser)]
#[command(name = "powermon", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options accepted by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log at info level instead of warn
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append logs to this file instead of stdout
    #[arg(short, long, global = true)]
    pub logfile: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "POWERMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pushover API token
    #[arg(
        short = 'k',
        long = "pushover-token",
        global = true,
        env = "POWERMON_PUSHOVER_TOKEN"
    )]
    pub pushover_token: Option<String>,

    /// Pushover user token to notify (repeatable)
    #[arg(short = 'u', long = "user-token", global = true)]
    pub user_tokens: Vec<String>,

    /// Name shown in notifications and verification reports
    #[arg(short, long, global = true)]
    pub nickname: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe a server and shut this machine down when it stays unreachable
    Client(ClientArgs),
    /// Answer probes and wake machines with Wake-on-LAN
    Server(ServerArgs),
    /// List network interfaces and their hardware addresses
    Mac,
    /// Report this machine's hardware addresses to a server once
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Server host name or IP address
    #[arg(short = 'a', long = "host")]
    pub host: Option<String>,

    /// Server port [default: 10101]
    #[arg(short, long)]
    pub port: Option<u32>,

    /// Seconds of continuous failure before shutting down [default: 60]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Seconds between successful probes [default: 60]
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Seconds between failed probes [default: 3]
    #[arg(long)]
    pub retry_interval: Option<u64>,

    /// Network timeout of one probe in seconds [default: 2]
    #[arg(long)]
    pub probe_timeout: Option<u64>,

    /// Probe over https
    #[arg(long)]
    pub tls: bool,

    /// Send this machine's identity with every probe
    #[arg(long)]
    pub verify: bool,

    /// Run the shutdown command through sudo
    #[arg(long)]
    pub sudo: bool,

    /// Command to run instead of shutting down
    #[arg(long)]
    pub on_timeout: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Port to listen on [default: 10101]
    #[arg(short, long)]
    pub port: Option<u32>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    pub bind: Option<String>,

    /// Hardware address to wake at startup (repeatable)
    #[arg(short, long)]
    pub wake: Vec<String>,

    /// File listing hardware addresses to wake, one per line
    #[arg(long)]
    pub wakelist: Option<PathBuf>,

    /// Keep waking until every target reports back online
    #[arg(long)]
    pub verify: bool,

    /// Seconds between wake rounds [default: 15]
    #[arg(long)]
    pub tick_interval: Option<u64>,

    /// Wake rounds sent without --verify [default: 10]
    #[arg(long)]
    pub attempt_budget: Option<u32>,

    /// Destination address of wake packets [default: 255.255.255.255]
    #[arg(long)]
    pub broadcast: Option<String>,

    /// Destination UDP port of wake packets [default: 9]
    #[arg(long)]
    pub wol_port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Server host name or IP address
    #[arg(short = 'a', long = "host")]
    pub host: Option<String>,

    /// Server port [default: 10101]
    #[arg(short, long)]
    pub port: Option<u32>,

    /// Report over https
    #[arg(long)]
    pub tls: bool,
}

// ── Merge with the configuration file ─────────────────────────────────────────

impl GlobalArgs {
    pub fn merge_general(&self, file: &GeneralConfig) -> GeneralConfig {
        GeneralConfig {
            verbose: self.verbose || file.verbose,
            logfile: self.logfile.clone().or_else(|| file.logfile.clone()),
            nickname: self.nickname.clone().or_else(|| file.nickname.clone()),
        }
    }

    pub fn merge_pushover(&self, file: &PushoverConfig) -> PushoverConfig {
        PushoverConfig {
            token: self.pushover_token.clone().or_else(|| file.token.clone()),
            users: if self.user_tokens.is_empty() {
                file.users.clone()
            } else {
                self.user_tokens.clone()
            },
        }
    }
}

impl ClientArgs {
    pub fn merge(self, file: ClientConfig) -> ClientConfig {
        ClientConfig {
            host: self.host.or(file.host),
            port: self.port.unwrap_or(file.port),
            timeout_secs: self.timeout.unwrap_or(file.timeout_secs),
            interval_secs: self.interval.unwrap_or(file.interval_secs),
            retry_interval_secs: self.retry_interval.unwrap_or(file.retry_interval_secs),
            probe_timeout_secs: self.probe_timeout.unwrap_or(file.probe_timeout_secs),
            tls: self.tls || file.tls,
            verify: self.verify || file.verify,
            sudo: self.sudo || file.sudo,
            on_timeout: self.on_timeout.or(file.on_timeout),
        }
    }
}

impl ServerArgs {
    pub fn merge(self, file: ServerConfig) -> ServerConfig {
        ServerConfig {
            bind: self.bind.unwrap_or(file.bind),
            port: self.port.unwrap_or(file.port),
            wake: if self.wake.is_empty() { file.wake } else { self.wake },
            wakelist: self.wakelist.or(file.wakelist),
            verify: self.verify || file.verify,
            tick_interval_secs: self.tick_interval.unwrap_or(file.tick_interval_secs),
            attempt_budget: self.attempt_budget.unwrap_or(file.attempt_budget),
            broadcast: self.broadcast.unwrap_or(file.broadcast),
            wol_port: self.wol_port.unwrap_or(file.wol_port),
        }
    }
}

impl VerifyArgs {
    /// Takes the server address from the `[client]` table when omitted.
    pub fn merge(self, file: ClientConfig) -> ClientConfig {
        ClientConfig {
            host: self.host.or(file.host),
            port: self.port.unwrap_or(file.port),
            tls: self.tls || file.tls,
            ..file
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use powermon_core::config::PowermonConfig;

    fn client_args(argv: &[&str]) -> ClientArgs {
        match Cli::parse_from(argv).command {
            Command::Client(args) => args,
            other => panic!("expected client, got {other:?}"),
        }
    }

    fn server_args(argv: &[&str]) -> ServerArgs {
        match Cli::parse_from(argv).command {
            Command::Server(args) => args,
            other => panic!("expected server, got {other:?}"),
        }
    }

    #[test]
    fn test_client_defaults_come_from_config_defaults() {
        // Arrange
        let args = client_args(&["powermon", "client", "-a", "10.0.0.2"]);

        // Act
        let cfg = args.merge(ClientConfig::default());

        // Assert
        assert_eq!(cfg.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(cfg.port, 10101);
        assert_eq!(cfg.timeout_secs, 60);
        assert_eq!(cfg.interval_secs, 60);
        assert_eq!(cfg.retry_interval_secs, 3);
        assert_eq!(cfg.probe_timeout_secs, 2);
        assert!(!cfg.verify);
    }

    #[test]
    fn test_client_short_options() {
        let args = client_args(&[
            "powermon", "client", "-a", "nas", "-p", "8080", "-t", "120", "-i", "30",
        ]);

        let cfg = args.merge(ClientConfig::default());

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 120);
        assert_eq!(cfg.interval_secs, 30);
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        // Arrange
        let file = PowermonConfig::from_toml(
            "[client]\nhost = \"from-file\"\ntimeout_secs = 300\nverify = true\n",
        )
        .unwrap();
        let args = client_args(&["powermon", "client", "--host", "from-cli"]);

        // Act
        let cfg = args.merge(file.client);

        // Assert
        assert_eq!(cfg.host.as_deref(), Some("from-cli"));
        assert_eq!(cfg.timeout_secs, 300, "file value kept when not on the command line");
        assert!(cfg.verify, "file can enable a flag");
    }

    #[test]
    fn test_server_repeatable_wake_and_flags() {
        let args = server_args(&[
            "powermon",
            "server",
            "-w",
            "aa:aa:aa:aa:aa:aa",
            "--wake",
            "bb:bb:bb:bb:bb:bb",
            "--verify",
            "--tick-interval",
            "5",
        ]);

        let cfg = args.merge(ServerConfig::default());

        assert_eq!(cfg.wake.len(), 2);
        assert!(cfg.verify);
        assert_eq!(cfg.tick_interval_secs, 5);
        assert_eq!(cfg.attempt_budget, 10);
        assert_eq!(cfg.bind, "0.0.0.0");
        assert_eq!(cfg.broadcast, "255.255.255.255");
        assert_eq!(cfg.wol_port, 9);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        // Arrange / Act
        let cli = Cli::parse_from([
            "powermon", "server", "-v", "-k", "app", "-u", "u1", "-u", "u2", "-n", "office",
        ]);

        // Assert
        assert!(cli.global.verbose);
        let pushover = cli.global.merge_pushover(&PushoverConfig::default());
        assert_eq!(pushover.token.as_deref(), Some("app"));
        assert_eq!(pushover.users, vec!["u1".to_string(), "u2".to_string()]);
        let general = cli.global.merge_general(&GeneralConfig::default());
        assert_eq!(general.nickname.as_deref(), Some("office"));
    }

    #[test]
    fn test_verify_falls_back_to_client_table() {
        let file = PowermonConfig::from_toml("[client]\nhost = \"nas\"\nport = 2020\n").unwrap();
        let args = match Cli::parse_from(["powermon", "verify"]).command {
            Command::Verify(args) => args,
            other => panic!("expected verify, got {other:?}"),
        };

        let cfg = args.merge(file.client);

        assert_eq!(cfg.host.as_deref(), Some("nas"));
        assert_eq!(cfg.port, 2020);
    }

    #[test]
    fn test_mac_subcommand_parses() {
        assert!(matches!(Cli::parse_from(["powermon", "mac"]).command, Command::Mac));
    }
}
