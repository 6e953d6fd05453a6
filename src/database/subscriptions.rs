// ABOUTME: Typed access to subscription_plans and tenant_subscriptions, backing the feature guard
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppResult;

/// A subscription plan and the feature codes it unlocks.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriptionPlan {
    /// Plan id.
    pub id: Uuid,
    /// Display name, e.g. `starter`, `growth`, `enterprise`.
    pub name: String,
    /// Feature codes this plan includes, stored as a JSON array.
    pub features: sqlx::types::Json<Vec<String>>,
}

/// Typed access to subscription plans and tenant bindings.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Build a repository over the main pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up the feature set enabled for `gym_id`, if it has an active subscription.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn active_features(&self, gym_id: Uuid) -> AppResult<Option<Vec<String>>> {
        let row: Option<(sqlx::types::Json<Vec<String>>,)> = sqlx::query_as(
            "SELECT sp.features FROM tenant_subscriptions ts
             JOIN subscription_plans sp ON sp.id = ts.plan_id
             WHERE ts.tenant_id = $1 AND ts.is_active = true",
        )
        .bind(gym_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(features,)| features.0))
    }

    /// Bind a tenant to a plan, replacing any existing binding.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn set_plan(&self, gym_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tenant_subscriptions (tenant_id, plan_id, is_active)
             VALUES ($1, $2, true)
             ON CONFLICT (tenant_id) DO UPDATE SET plan_id = $2, is_active = true, updated_at = now()",
        )
        .bind(gym_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
