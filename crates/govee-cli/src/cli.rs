//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Discover and control Govee BLE lights", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Scan for lights and report each one as it is discovered
    Scan {
        /// Scan duration in seconds (defaults to the configured duration)
        #[arg(short, long)]
        duration: Option<u64>,
        /// Print discovered devices as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Look up a single light by address
    Find {
        /// Bluetooth address, case-insensitive
        address: String,
        /// Lookup timeout in seconds (defaults to the configured timeout)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Turn a light on
    On { address: String },
    /// Turn a light off
    Off { address: String },
    /// Set a light's color
    Color {
        address: String,
        red: u8,
        green: u8,
        blue: u8,
    },
    /// Set a light's brightness in percent
    Brightness { address: String, percent: u8 },
    /// Print an example configuration file
    Config,
}

impl Commands {
    /// Address the command targets, if any
    pub fn address(&self) -> Option<&str> {
        match self {
            Commands::Find { address, .. }
            | Commands::On { address }
            | Commands::Off { address }
            | Commands::Color { address, .. }
            | Commands::Brightness { address, .. } => Some(address),
            Commands::Scan { .. } | Commands::Config => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        let cli = Cli::parse_from(["govee", "color", "A4:C1:38:AA:BB:01", "255", "0", "16"]);
        assert_eq!(
            cli.command,
            Commands::Color {
                address: "A4:C1:38:AA:BB:01".to_string(),
                red: 255,
                green: 0,
                blue: 16,
            }
        );
        assert_eq!(cli.command.address(), Some("A4:C1:38:AA:BB:01"));
    }

    #[test]
    fn test_channel_out_of_range_rejected() {
        let result = Cli::try_parse_from(["govee", "color", "A4:C1:38:AA:BB:01", "256", "0", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["govee", "scan", "--json", "-v", "--config", "govee.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("govee.toml"));
        assert_eq!(
            cli.command,
            Commands::Scan {
                duration: None,
                json: true
            }
        );
    }
}
