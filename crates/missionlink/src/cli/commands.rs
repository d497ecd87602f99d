//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Monitor command arguments.
#[derive(Debug, Args)]
pub struct MonitorCommand {
    /// Initiate launch immediately instead of waiting for the `launch` command
    #[arg(short, long)]
    pub launch: bool,

    /// Emit one JSON snapshot per frame instead of drawing the dashboard
    #[arg(short, long)]
    pub json: bool,

    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,
}

/// Fetch command arguments.
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_command_debug() {
        let cmd = MonitorCommand {
            launch: true,
            json: false,
            no_color: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("launch: true"));
    }

    #[test]
    fn test_fetch_command_debug() {
        let cmd = FetchCommand { json: true };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Validate {
            file: Some(PathBuf::from("/tmp/missionlink.toml")),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Validate"));
        assert!(debug_str.contains("missionlink.toml"));
    }
}
