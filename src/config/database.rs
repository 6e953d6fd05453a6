// ABOUTME: Pool sizing knobs for the main pool and the per-request tenant pool
// ABOUTME: Grounded on the teacher's PostgresPoolConfig, trimmed to a Postgres-only shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::time::Duration;

use anyhow::{Context, Result};

/// Default `max_connections` for the pool backing the `public` schema.
pub const MAIN_POOL_DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Default `max_connections` for the pool used to serve tenant-schema requests.
pub const TENANT_POOL_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Pool sizing for both the main and tenant `sqlx::PgPool`s.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Max connections for the main-schema pool.
    pub main_max_connections: u32,
    /// Max connections for the tenant-schema pool.
    pub tenant_max_connections: u32,
    /// How long to wait for a connection before returning a transient error.
    pub acquire_timeout: Duration,
    /// How many times the broker retries acquiring a connection on a transient failure.
    pub connection_retries: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            main_max_connections: MAIN_POOL_DEFAULT_MAX_CONNECTIONS,
            tenant_max_connections: TENANT_POOL_DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(10),
            connection_retries: 3,
        }
    }
}

impl PoolConfig {
    /// Read optional pool-tuning variables from the environment, falling back to defaults.
    ///
    /// # Errors
    /// Fails if a present variable does not parse as its expected numeric type.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            main_max_connections: optional_parsed(
                "MAIN_POOL_MAX_CONNECTIONS",
                defaults.main_max_connections,
            )?,
            tenant_max_connections: optional_parsed(
                "TENANT_POOL_MAX_CONNECTIONS",
                defaults.tenant_max_connections,
            )?,
            acquire_timeout: Duration::from_secs(optional_parsed(
                "POOL_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),
            connection_retries: optional_parsed(
                "POOL_CONNECTION_RETRIES",
                defaults.connection_retries,
            )?,
        })
    }
}

fn optional_parsed<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a valid number")),
        Err(_) => Ok(default),
    }
}
