// ABOUTME: Bind address and CORS allow-list, derived from the frontend origin
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use anyhow::Result;

use super::environment::EnvironmentConfig;

/// Network-facing settings: bind address and allowed CORS origin.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: std::net::SocketAddr,
    /// The single frontend origin allowed to make cross-origin requests.
    pub allowed_origin: String,
}

impl NetworkConfig {
    /// Derive bind address and CORS allow-list from already-loaded environment config.
    ///
    /// # Errors
    /// Fails if the resulting bind address cannot be parsed (should not happen given a
    /// valid `u16` port).
    pub fn from_env(environment: &EnvironmentConfig) -> Result<Self> {
        let bind_addr = std::net::SocketAddr::from(([0, 0, 0, 0], environment.port));
        Ok(Self {
            bind_addr,
            allowed_origin: environment.frontend_url.clone(),
        })
    }
}
