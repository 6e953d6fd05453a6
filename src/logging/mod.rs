// ABOUTME: Process-wide tracing subscriber init, the one place log format is decided
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber. Call exactly once, at process startup.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;
    match config.format {
        LogFormat::Pretty => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }
        LogFormat::Json => {
            fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }
    }
    Ok(())
}
