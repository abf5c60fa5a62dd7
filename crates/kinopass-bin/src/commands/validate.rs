// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `validate` command: parse a config file and report problems.

use kinopass_api::ApiConfig;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Executes the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<(), CliError> {
    let config = ApiConfig::from_file(&args.config)?;

    if config.token.secret.is_empty() {
        println!(
            "warning: [token] secret is empty; set it in the file or via KINOPASS_TOKEN_SECRET"
        );
    }
    if config.cache.url.is_none() {
        println!("warning: [cache] url is not set; revocation state will not be shared");
    }

    println!("{} is valid", args.config.display());
    Ok(())
}
