// ABOUTME: Process configuration assembled once at startup from the environment
// ABOUTME: Any missing required variable is a fatal startup error, never a silent default
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod database;
mod environment;
mod logging;
mod network;

pub use database::{PoolConfig, MAIN_POOL_DEFAULT_MAX_CONNECTIONS, TENANT_POOL_DEFAULT_MAX_CONNECTIONS};
pub use environment::EnvironmentConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use network::NetworkConfig;

use anyhow::{Context, Result};

/// Top level process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Environment-derived settings: database URLs, JWT secret, bind port.
    pub environment: EnvironmentConfig,
    /// Connection pool sizing for the main and tenant pools.
    pub pools: PoolConfig,
    /// CORS allow-list and bind address.
    pub network: NetworkConfig,
    /// Logging format and level.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed. Connection
    /// strings and secrets are never defaulted silently.
    pub fn from_env() -> Result<Self> {
        let environment = EnvironmentConfig::from_env().context("loading environment config")?;
        let pools = PoolConfig::from_env().context("loading pool config")?;
        let network = NetworkConfig::from_env(&environment).context("loading network config")?;
        let logging = LoggingConfig::from_env();
        Ok(Self {
            environment,
            pools,
            network,
            logging,
        })
    }
}
