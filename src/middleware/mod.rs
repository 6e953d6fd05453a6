// ABOUTME: Axum middleware: request authentication/context, CORS, and request tracing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

pub mod context;
pub mod cors;
pub mod tracing;

pub use context::authenticate;
