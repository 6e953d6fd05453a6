// ABOUTME: Membership plan catalog: list for every role, create/retire for gym owners
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{require_role, GymScope};
use crate::context::RequestContext;
use crate::errors::{AppError, AppResult};
use crate::kernel::SoftDelete;
use crate::tenant::Role;

/// A membership plan as returned to clients.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PlanDto {
    /// Plan id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// List price.
    pub price: Decimal,
    /// Coverage length in days once purchased.
    pub duration_days: i32,
}

/// `GET /api/plans`: every non-retired plan, unpaginated since gyms rarely carry more
/// than a handful.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn list(Extension(ctx): Extension<Arc<RequestContext>>) -> AppResult<Json<Vec<PlanDto>>> {
    GymScope::required(&ctx.principal)?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let rows: Vec<PlanDto> =
        sqlx::query_as("SELECT id, name, price, duration_days FROM plans WHERE is_deleted = false ORDER BY price")
            .fetch_all(&mut **conn)
            .await?;
    Ok(Json(rows))
}

/// Body for adding a plan to the catalog.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    /// Display name.
    pub name: String,
    /// List price.
    pub price: Decimal,
    /// Coverage length in days.
    pub duration_days: i32,
}

/// `POST /api/plans`: gym owners only.
///
/// # Errors
/// Propagates database errors.
pub async fn create(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<CreatePlanRequest>,
) -> AppResult<Json<PlanDto>> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO plans (id, name, price, duration_days) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&body.name)
        .bind(body.price)
        .bind(body.duration_days)
        .execute(&mut **conn)
        .await?;

    let plan: PlanDto = sqlx::query_as("SELECT id, name, price, duration_days FROM plans WHERE id = $1")
        .bind(id)
        .fetch_one(&mut **conn)
        .await?;
    Ok(Json(plan))
}

/// `DELETE /api/plans/:id`: retire a plan, gym owners only. Existing memberships on the
/// plan are unaffected; only new enrollment is blocked once `find` stops returning it.
///
/// # Errors
/// Returns [`AppError::not_found`] if the plan doesn't exist or was already retired.
pub async fn retire(Extension(ctx): Extension<Arc<RequestContext>>, Path(id): Path<Uuid>) -> AppResult<()> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let affected = SoftDelete::delete(&mut conn, "plans", id, ctx.principal.user_id).await?;
    if affected == 0 {
        return Err(AppError::not_found("plan"));
    }
    Ok(())
}
