// ABOUTME: Typed access to the main-schema tenants table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::tenant::TenantRegistry;

/// A row in `tenants`: one gym's registration record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tenant {
    /// Tenant id, also used to derive the schema name.
    pub id: Uuid,
    /// Display name of the gym.
    pub name: String,
    /// The platform user who owns this tenant.
    pub owner_id: Option<Uuid>,
    /// The Postgres schema name holding this tenant's data.
    pub tenant_schema_name: String,
    /// Whether the tenant is active (subscription in good standing).
    pub is_active: bool,
    /// When the tenant was registered.
    pub created_at: DateTime<Utc>,
}

/// Typed access to the `tenants` table.
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    /// Build a repository over the main pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new tenant row and provision its schema via the [`TenantRegistry`].
    ///
    /// # Errors
    /// Returns [`AppError::conflict`] if the name collides under a unique constraint, or
    /// propagates schema-provisioning errors.
    pub async fn register(&self, registry: &TenantRegistry, name: &str, owner_id: Uuid) -> AppResult<Tenant> {
        let id = Uuid::new_v4();
        let schema_name = TenantRegistry::schema_name(id);
        sqlx::query(
            "INSERT INTO tenants (id, name, owner_id, tenant_schema_name) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(name)
        .bind(owner_id)
        .bind(&schema_name)
        .execute(&self.pool)
        .await?;

        registry.create(id).await?;

        self.find(id).await?.ok_or_else(|| AppError::internal("tenant vanished after insert"))
    }

    /// Look up one tenant by id.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn find(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        let tenant = sqlx::query_as(
            "SELECT id, name, owner_id, tenant_schema_name, is_active, created_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    /// List every tenant, active or not.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn list_all(&self) -> AppResult<Vec<Tenant>> {
        let tenants = sqlx::query_as(
            "SELECT id, name, owner_id, tenant_schema_name, is_active, created_at FROM tenants ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }
}
