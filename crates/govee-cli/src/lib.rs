//! Govee CLI library
//!
//! Argument parsing, configuration and command handlers for the `govee`
//! binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::{AppConfig, CliConfig};
pub use error::{CliError, Result};
