// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Kinopass auth service entry point.

use clap::Parser;

use kinopass_bin::cli::{Cli, Command};
use kinopass_bin::commands;
use kinopass_bin::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => {
            init_logging(&args.log_level, args.log_format);
            commands::run::execute(args).await
        }
        Command::Validate(args) => commands::validate::execute(args),
        Command::Version => {
            commands::version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
