// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command-line interface definition.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Kinopass - authentication service for the movie-catalog platform.
#[derive(Debug, Parser)]
#[command(name = "kinopass", version, about)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the auth service.
    Run(RunArgs),
    /// Validate a configuration file.
    Validate(ValidateArgs),
    /// Print version information.
    Version,
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Override the bind port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Force in-memory backends regardless of configuration.
    #[arg(long)]
    pub dev: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Arguments for the `validate` command.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the TOML configuration file.
    pub config: PathBuf,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for log aggregation.
    Json,
    /// Minimal compact output.
    Compact,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["kinopass", "run", "--port", "9000", "--dev"]);

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.dev);
                assert_eq!(args.log_level, "info");
                assert_eq!(args.log_format, LogFormat::Text);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::parse_from(["kinopass", "validate", "kinopass.toml"]);

        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.config, PathBuf::from("kinopass.toml"));
            }
            _ => panic!("expected validate command"),
        }
    }
}
