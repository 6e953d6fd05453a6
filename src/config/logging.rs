// ABOUTME: Log output format, configuration-driven: human-readable locally, JSON in prod
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Wire format for emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored when stdout is a tty. Default outside production.
    Pretty,
    /// Newline-delimited JSON, one object per log line. Used when `LOG_FORMAT=json`.
    Json,
}

/// Logging configuration read from the environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format for log lines.
    pub format: LogFormat,
    /// `RUST_LOG`-style directive string, e.g. `"gymflow_server=debug,tower_http=info"`.
    pub filter: String,
}

impl LoggingConfig {
    /// Read `LOG_FORMAT` and `RUST_LOG` from the environment. Never fails: defaults apply.
    #[must_use]
    pub fn from_env() -> Self {
        let format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "gymflow_server=info,tower_http=info".to_owned());
        Self { format, filter }
    }
}
