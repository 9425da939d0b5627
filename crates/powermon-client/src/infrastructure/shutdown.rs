//! Concrete [`ShutdownAction`]s.
//!
//! - [`SystemShutdown`] powers the machine off with the platform's
//!   `shutdown` command (optionally through `sudo` on Unix).
//! - [`CommandShutdown`] runs an operator supplied shell command instead,
//!   e.g. to hibernate or to notify another system.
//!
//! Both block until the command exits; the timeout controller calls them
//! from `spawn_blocking`.

use std::process::Command;

use tracing::info;

use crate::application::timeout_controller::{ShutdownAction, ShutdownError};

/// Program and arguments of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command to completion.
    ///
    /// # Errors
    ///
    /// [`ShutdownError::Spawn`] if it cannot be started, [`ShutdownError::Failed`]
    /// if it exits unsuccessfully.
    fn run(&self) -> Result<(), ShutdownError> {
        let command = self.display();
        info!("running '{command}'");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| ShutdownError::Spawn {
                command: command.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ShutdownError::Failed {
                command,
                status: status.to_string(),
            })
        }
    }
}

/// Shuts the operating system down immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShutdown {
    /// Prefix the command with `sudo`.  Ignored on Windows.
    pub sudo: bool,
}

impl SystemShutdown {
    pub fn new(sudo: bool) -> Self {
        Self { sudo }
    }

    /// The command line this action runs on the current platform.
    pub fn command(&self) -> CommandLine {
        if cfg!(windows) {
            CommandLine::new("shutdown", &["/s", "/t", "0"])
        } else if self.sudo {
            CommandLine::new("sudo", &["shutdown", "now"])
        } else {
            CommandLine::new("shutdown", &["now"])
        }
    }
}

impl ShutdownAction for SystemShutdown {
    fn shutdown(&self) -> Result<(), ShutdownError> {
        self.command().run()
    }
}

/// Runs a custom shell command as the terminal action.
#[derive(Debug, Clone)]
pub struct CommandShutdown {
    script: String,
}

impl CommandShutdown {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn command(&self) -> CommandLine {
        if cfg!(windows) {
            CommandLine::new("cmd", &["/C", &self.script])
        } else {
            CommandLine::new("sh", &["-c", &self.script])
        }
    }
}

impl ShutdownAction for CommandShutdown {
    fn shutdown(&self) -> Result<(), ShutdownError> {
        self.command().run()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
