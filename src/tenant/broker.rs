// ABOUTME: Pins a pooled connection's search_path to one tenant schema for the closure's duration
// ABOUTME: Always restores search_path to public before the connection returns to the pool
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::future::Future;

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::errors::AppResult;

use super::registry::TenantRegistry;

/// Routes requests to either the main pool or a tenant-schema-pinned connection.
#[derive(Clone)]
pub struct TenantBroker {
    main_pool: PgPool,
    tenant_pool: PgPool,
}

impl TenantBroker {
    /// Build a broker over the main and tenant connection pools.
    #[must_use]
    pub const fn new(main_pool: PgPool, tenant_pool: PgPool) -> Self {
        Self {
            main_pool,
            tenant_pool,
        }
    }

    /// The underlying tenant-schema connection pool, for callers (like the context
    /// middleware) that need to pin a connection for longer than one closure call.
    #[must_use]
    pub const fn tenant_pool(&self) -> &PgPool {
        &self.tenant_pool
    }

    /// Run `f` against the main pool, unscoped to any tenant schema.
    ///
    /// # Errors
    /// Propagates whatever error `f` returns.
    pub async fn with_main<F, Fut, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        f(self.main_pool.clone()).await
    }

    /// Check out a tenant-pool connection, pin its `search_path` to `gym_id`'s schema,
    /// run `f`, then restore `search_path` to `public` before the connection returns to
    /// the pool. The restore runs even if `f` errors, so a failed request can never leak
    /// a mis-scoped connection back into the pool.
    ///
    /// # Errors
    /// Propagates whatever error `f` returns, or a database error acquiring the
    /// connection or setting `search_path`.
    pub async fn with_tenant<F, Fut, T>(&self, gym_id: Uuid, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut PoolConnection<Postgres>) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let schema = TenantRegistry::schema_name(gym_id);
        let mut conn = self.tenant_pool.acquire().await?;
        sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
            .execute(&mut *conn)
            .await?;

        let result = f(&mut conn).await;

        if let Err(restore_err) = sqlx::query("SET search_path TO public")
            .execute(&mut *conn)
            .await
        {
            tracing::error!(gym_id = %gym_id, error = %restore_err, "failed to restore search_path, dropping connection");
            conn.close().await.ok();
        }

        result
    }
}
