// ABOUTME: Process-wide shared state and the per-request client bundle
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod request;

pub use request::RequestContext;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::notifications::NotificationHub;
use crate::tenant::{TenantBroker, TenantRegistry};

/// Shared, cloneable application state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Pool for the `public` schema, used directly for main-schema reads/writes.
    pub main_pool: PgPool,
    /// Broker for acquiring tenant-schema-pinned connections.
    pub broker: TenantBroker,
    /// Tenant schema lifecycle manager.
    pub registry: TenantRegistry,
    /// Token issuance/verification.
    pub tokens: TokenService,
    /// Notification storage and fan-out.
    pub notifications: NotificationHub,
    /// Process configuration, kept for handlers that need a setting directly.
    pub config: AppConfig,
}
