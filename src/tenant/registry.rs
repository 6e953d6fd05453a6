// ABOUTME: Maps gym ids to Postgres schema names and tracks which tenant schemas exist
// ABOUTME: Schema creation is idempotent and seeds the tenant migration baseline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::migrations::{self, MigrationFamily};

/// Resolves gym ids to schema names and manages tenant schema lifecycle.
#[derive(Clone)]
pub struct TenantRegistry {
    main_pool: PgPool,
}

/// Postgres identifiers are limited to 63 bytes; a hyphenated UUID plus prefix fits easily.
fn schema_name(gym_id: Uuid) -> String {
    format!("tenant_{}", gym_id.simple())
}

impl TenantRegistry {
    /// Build a registry backed by the main (`public` schema) connection pool.
    #[must_use]
    pub const fn new(main_pool: PgPool) -> Self {
        Self { main_pool }
    }

    /// The schema name a gym's tenant data lives under.
    #[must_use]
    pub fn schema_name(gym_id: Uuid) -> String {
        schema_name(gym_id)
    }

    /// Whether the tenant schema for `gym_id` already exists.
    ///
    /// # Errors
    /// Propagates any database error as [`AppError`].
    pub async fn exists(&self, gym_id: Uuid) -> AppResult<bool> {
        let schema = schema_name(gym_id);
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
        )
        .bind(&schema)
        .fetch_optional(&self.main_pool)
        .await?;
        Ok(row.is_some_and(|(exists,)| exists))
    }

    /// Create the tenant schema for `gym_id` if it does not already exist, then run the
    /// full tenant migration family against it. Idempotent: calling this twice is a no-op
    /// the second time.
    ///
    /// # Errors
    /// Propagates schema-creation or migration errors.
    pub async fn create(&self, gym_id: Uuid) -> AppResult<()> {
        if self.exists(gym_id).await? {
            return Ok(());
        }
        let schema = schema_name(gym_id);
        let mut tx = self.main_pool.begin().await?;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        migrations::run(&self.main_pool, MigrationFamily::Tenant(schema.clone())).await?;
        sqlx::query("INSERT INTO active_tenant_schemas (gym_id, schema_name) VALUES ($1, $2) ON CONFLICT (gym_id) DO NOTHING")
            .bind(gym_id)
            .bind(&schema)
            .execute(&self.main_pool)
            .await?;
        tracing::info!(gym_id = %gym_id, schema = %schema, "tenant schema created");
        Ok(())
    }

    /// Irreversibly drop a tenant's schema and all of its data.
    ///
    /// # Errors
    /// Propagates database errors. Does not verify the schema is otherwise unused;
    /// callers are responsible for gating this behind an explicit confirmation step.
    pub async fn drop_schema(&self, gym_id: Uuid) -> AppResult<()> {
        let schema = schema_name(gym_id);
        if !self.exists(gym_id).await? {
            return Err(AppError::not_found(format!("tenant schema {schema}")));
        }
        sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{schema}\" CASCADE"))
            .execute(&self.main_pool)
            .await?;
        sqlx::query("DELETE FROM active_tenant_schemas WHERE gym_id = $1")
            .bind(gym_id)
            .execute(&self.main_pool)
            .await?;
        tracing::warn!(gym_id = %gym_id, schema = %schema, "tenant schema dropped");
        Ok(())
    }

    /// List the gym ids of every active (non-dropped) tenant schema. Used by the
    /// scheduler to fan out cron jobs across tenants.
    ///
    /// # Errors
    /// Propagates any database error.
    pub async fn list_active(&self) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT gym_id FROM active_tenant_schemas ORDER BY gym_id")
                .fetch_all(&self.main_pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_name_is_deterministic_and_safe() {
        let id = Uuid::nil();
        let name = TenantRegistry::schema_name(id);
        assert_eq!(name, "tenant_00000000000000000000000000000000");
        assert!(name.len() <= 63);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
