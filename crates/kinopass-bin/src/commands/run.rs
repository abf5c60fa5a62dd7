// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `run` command: assemble state and serve.

use std::sync::Arc;

use tracing::{info, warn};

use kinopass_api::{ApiConfig, ApiServer, AppState};
use kinopass_core::cache::{MemoryTokenCache, RedisTokenCache, TokenCache};
use kinopass_core::identity::{IdentityStore, MemoryIdentityStore};
use kinopass_core::oauth::YandexOAuth;
use kinopass_core::password;
use kinopass_core::types::{NewUser, ADMIN_ROLE, DEFAULT_ROLE};
use kinopass_core::StoreError;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::shutdown::shutdown_signal;

/// Environment variable holding the token signing secret.
const TOKEN_SECRET_ENV: &str = "KINOPASS_TOKEN_SECRET";

/// Executes the `run` command.
pub async fn execute(args: RunArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => ApiConfig::from_file(path)?,
        None => ApiConfig::default(),
    };

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Ok(secret) = std::env::var(TOKEN_SECRET_ENV) {
        config.token.secret = secret;
    }

    let cache = build_cache(&config, args.dev).await?;
    let identity = build_identity(&config).await?;

    let mut builder = AppState::builder()
        .config(config.clone())
        .cache(cache)
        .identity(identity);

    if let Some(yandex) = config.oauth.yandex.clone() {
        builder = builder.oauth_provider(Arc::new(YandexOAuth::new(yandex)));
        info!("yandex oauth provider enabled");
    }

    let state = builder.build()?;

    ApiServer::new(state).serve(shutdown_signal()).await?;
    Ok(())
}

/// Chooses the revocation cache backend.
async fn build_cache(config: &ApiConfig, dev: bool) -> Result<Arc<dyn TokenCache>, CliError> {
    if dev {
        info!("dev mode: using in-memory revocation cache");
        return Ok(Arc::new(MemoryTokenCache::new()));
    }

    match &config.cache.url {
        Some(url) => {
            let cache = RedisTokenCache::connect(url).await?;
            info!(%url, "connected to redis revocation cache");
            Ok(Arc::new(cache))
        }
        None => {
            warn!("no cache url configured, falling back to in-memory revocation cache");
            Ok(Arc::new(MemoryTokenCache::new()))
        }
    }
}

/// Builds the identity store and seeds the base roles plus the bootstrap
/// superuser when configured.
///
/// The durable relational store is an external service; this process wires
/// the in-memory realization and seeds it so a fresh deployment has a way
/// in.
async fn build_identity(config: &ApiConfig) -> Result<Arc<dyn IdentityStore>, CliError> {
    let identity = Arc::new(MemoryIdentityStore::new());

    for kind in [ADMIN_ROLE, DEFAULT_ROLE] {
        match identity.create_role(kind).await {
            Ok(_) | Err(StoreError::Conflict { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if let (Some(email), Some(pass)) = (
        &config.bootstrap.superuser_email,
        &config.bootstrap.superuser_password,
    ) {
        let hash = password::hash_password(pass)
            .map_err(|e| CliError::Config(format!("cannot hash bootstrap password: {}", e)))?;

        match identity
            .create_user(NewUser {
                email: email.clone(),
                password_hash: hash,
                first_name: None,
                last_name: None,
                is_superuser: true,
            })
            .await
        {
            Ok(user) => info!(user_id = %user.id, "bootstrap superuser created"),
            Err(StoreError::Conflict { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(identity)
}
