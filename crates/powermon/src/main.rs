//! powermon: entry point.
//!
//! A battery-backed machine runs `powermon client` against a machine that
//! loses power with the grid, running `powermon server`.  When the server
//! stops answering for long enough the client shuts its own machine down;
//! when power returns and the server boots, it wakes the clients again with
//! Wake-on-LAN.
//!
//! # Usage
//!
//! ```text
//! powermon [GLOBAL OPTIONS] <COMMAND>
//!
//! Commands:
//!   client   Probe a server and shut down when it stays unreachable
//!   server   Answer probes and wake machines with Wake-on-LAN
//!   mac      List network interfaces and their hardware addresses
//!   verify   Report this machine's hardware addresses to a server once
//!
//! Global options:
//!   -v, --verbose               Log at info level instead of warn
//!   -l, --logfile <PATH>        Append logs to a file
//!   -c, --config <PATH>         TOML configuration file
//!   -k, --pushover-token <TOK>  Pushover API token
//!   -u, --user-token <TOK>      Pushover user token (repeatable)
//!   -n, --nickname <NAME>       Name used in notifications
//! ```
//!
//! # What happens at startup
//!
//! 1. Arguments are parsed with `clap`; the optional TOML file is loaded and
//!    merged underneath them.
//! 2. Logging is initialised (`RUST_LOG` overrides the level).
//! 3. The notifier is built; a token without users (or the reverse) is a
//!    configuration error.
//! 4. The subcommand validates its own options and only then starts any
//!    network activity.  Every configuration error exits non-zero.

mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use powermon_core::config::PowermonConfig;
use powermon_core::logging;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = PowermonConfig::load_optional(cli.global.config.as_deref())
        .context("failed to load configuration file")?;
    let general = cli.global.merge_general(&file.general);
    let pushover = cli.global.merge_pushover(&file.pushover);

    logging::init(general.verbose, general.logfile.as_deref())
        .context("failed to initialise logging")?;

    let notifier = commands::build_notifier(pushover, general.nickname.clone())?;
    let nickname = general.nickname.unwrap_or_default();

    match cli.command {
        Command::Client(args) => commands::run_client(args.merge(file.client), &nickname, notifier).await,
        Command::Server(args) => commands::run_server(args.merge(file.server), notifier).await,
        Command::Verify(args) => commands::run_verify(args.merge(file.client), &nickname).await,
        Command::Mac => commands::run_mac(),
    }
}
