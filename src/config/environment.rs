// ABOUTME: Required environment variables: database URLs, bind port, JWT secret
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use anyhow::{anyhow, Context, Result};
use zeroize::Zeroizing;

/// Environment-sourced settings needed to start the process.
#[derive(Clone)]
pub struct EnvironmentConfig {
    /// Postgres connection string for the pooled runtime connection.
    pub database_url: String,
    /// Postgres connection string used for migrations and direct/unpooled access.
    pub direct_url: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Origin the frontend is served from, used to build the CORS allow-list.
    pub frontend_url: String,
    /// HMAC signing secret for JWTs. Held zeroized; never logged or `Debug`-printed.
    pub jwt_secret: Zeroizing<String>,
}

impl std::fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("database_url", &"<redacted>")
            .field("direct_url", &"<redacted>")
            .field("port", &self.port)
            .field("frontend_url", &self.frontend_url)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl EnvironmentConfig {
    /// Read required variables from the process environment.
    ///
    /// # Errors
    /// Fails fast if `DATABASE_URL`, `DIRECT_URL`, `FRONTEND_URL`, or `JWT_SECRET` is
    /// missing, or if `PORT` is present but not a valid `u16`.
    pub fn from_env() -> Result<Self> {
        let database_url = required_var("DATABASE_URL")?;
        let direct_url = required_var("DIRECT_URL")?;
        let frontend_url = required_var("FRONTEND_URL")?;
        let jwt_secret = required_var("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }
        let port = std::env::var("PORT")
            .ok()
            .map(|v| v.parse::<u16>().context("PORT must be a valid u16"))
            .transpose()?
            .unwrap_or(8080);

        Ok(Self {
            database_url,
            direct_url,
            port,
            frontend_url,
            jwt_secret: Zeroizing::new(jwt_secret),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("missing required environment variable: {name}"))
}
