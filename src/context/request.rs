// ABOUTME: Per-request {principal, mainDb, tenantDb?} bundle, with typed failing accessors
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};
use crate::tenant::Principal;

/// Clients materialised for the lifetime of one request.
pub struct RequestContext {
    /// The authenticated principal for this request.
    pub principal: Principal,
    main_pool: PgPool,
    tenant_conn: Option<Mutex<PoolConnection<Postgres>>>,
}

impl RequestContext {
    /// Build a context from an authenticated principal, the main pool, and an optional
    /// already-schema-pinned tenant connection.
    #[must_use]
    pub const fn new(
        principal: Principal,
        main_pool: PgPool,
        tenant_conn: Option<Mutex<PoolConnection<Postgres>>>,
    ) -> Self {
        Self {
            principal,
            main_pool,
            tenant_conn,
        }
    }

    /// The main-schema pool. Always available.
    #[must_use]
    pub const fn main_db(&self) -> &PgPool {
        &self.main_pool
    }

    /// The tenant-schema-pinned connection, if this principal has a gym.
    ///
    /// # Errors
    /// Returns [`AppError::bad_request`] if no tenant client was acquired for this
    /// request (the principal has no gym context).
    pub fn tenant_db(&self) -> AppResult<&Mutex<PoolConnection<Postgres>>> {
        self.tenant_conn
            .as_ref()
            .ok_or_else(|| AppError::bad_request("this operation requires a gym context"))
    }

    /// The tenant-schema-pinned connection if present, without erroring when absent.
    #[must_use]
    pub const fn optional_tenant_db(&self) -> Option<&Mutex<PoolConnection<Postgres>>> {
        self.tenant_conn.as_ref()
    }

    /// Release the tenant connection, if any, restoring `search_path` to `public`
    /// before it returns to the pool. Called once, after the handler and response have
    /// both been produced, in LIFO order relative to context construction.
    pub async fn release(self) {
        if let Some(lock) = self.tenant_conn {
            let mut conn = lock.into_inner();
            if let Err(err) = sqlx::query("SET search_path TO public")
                .execute(&mut *conn)
                .await
            {
                tracing::error!(error = %err, "failed to restore search_path on request release");
                conn.close().await.ok();
            }
        }
    }
}
