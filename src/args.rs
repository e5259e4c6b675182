//! Command line argument parsing for the temperature manager

use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Raspberry Pi temperature manager
///
/// Drives the case fan from CPU/GPU temperature and shows status on the OLED.
#[derive(Parser, Debug)]
#[command(name = "temp-manager")]
#[command(about = "Raspberry Pi fan control daemon")]
#[command(version)]
pub struct Args {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Also append log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the daemon (default)
    Run,
    /// Take one reading and print it without touching the fan or display
    Status {
        /// Print a JSON report instead of the screen text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Save it to the configuration file instead of printing it
        #[arg(long)]
        write: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let args = Args::parse_from(["temp-manager"]);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(args.command, None);
    }

    #[test]
    fn test_status_json() {
        let args = Args::parse_from([
            "temp-manager",
            "-vv",
            "--config",
            "/tmp/x.json",
            "status",
            "--json",
        ]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, PathBuf::from("/tmp/x.json"));
        assert_eq!(args.command, Some(Commands::Status { json: true }));
    }

    #[test]
    fn test_config_write() {
        let args = Args::parse_from(["temp-manager", "config", "--write"]);
        assert_eq!(args.command, Some(Commands::Config { write: true }));

        let args = Args::parse_from(["temp-manager", "config"]);
        assert_eq!(args.command, Some(Commands::Config { write: false }));
    }
}
