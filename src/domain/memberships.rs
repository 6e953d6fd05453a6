// ABOUTME: Membership lifecycle endpoints: create pending, record payment, activate, cancel, list
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{require_role, GymScope};
use crate::context::{AppState, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::kernel::{FilterBuilder, FilterClause, FilterOp, FilterValue};
use crate::pagination::{Page, Pagination, PaginationMeta, PaginationQuery};
use crate::pipelines::membership;
use crate::tenant::Role;

/// A membership as returned to clients.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MembershipDto {
    /// Row id.
    pub id: Uuid,
    /// Member this membership belongs to.
    pub user_id: Uuid,
    /// Plan subscribed to.
    pub plan_id: Uuid,
    /// Current lifecycle status.
    pub status: String,
    /// First day of coverage.
    pub start_date: NaiveDate,
    /// Last day of coverage.
    pub end_date: NaiveDate,
    /// Amount actually charged after discounts.
    pub final_amount: Decimal,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

/// Body for enrolling a member in a plan, pending payment.
#[derive(Debug, Deserialize)]
pub struct CreateMembershipRequest {
    /// Member being enrolled.
    pub user_id: Uuid,
    /// Plan to enroll in.
    pub plan_id: Uuid,
    /// Branch the membership is sold through, if tracked.
    pub branch_id: Option<Uuid>,
    /// Discount applied before the final amount, defaults to zero.
    pub discount_amount: Option<Decimal>,
}

/// `POST /api/memberships`: enroll a member in a plan as `pending`, awaiting payment.
/// Staff, branch managers, and gym owners may enroll members.
///
/// # Errors
/// Returns [`AppError::not_found`] if the plan doesn't exist, or propagates database
/// errors.
pub async fn create(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<CreateMembershipRequest>,
) -> AppResult<Json<MembershipDto>> {
    require_role(&ctx.principal, &[Role::Staff, Role::BranchManager, Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;

    let (price, duration_days): (Decimal, i32) =
        sqlx::query_as("SELECT price, duration_days FROM plans WHERE id = $1 AND is_deleted = false")
            .bind(body.plan_id)
            .fetch_optional(&mut **conn)
            .await?
            .ok_or_else(|| AppError::not_found("plan"))?;

    let discount = body.discount_amount.unwrap_or(Decimal::ZERO);
    let final_amount = price - discount;
    let start_date = Utc::now().date_naive();
    let end_date = start_date + chrono::Duration::days(i64::from(duration_days));
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO memberships
            (id, user_id, plan_id, branch_id, status, start_date, end_date,
             original_amount, discount_amount, final_amount)
         VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9)",
    )
    .bind(id)
    .bind(body.user_id)
    .bind(body.plan_id)
    .bind(body.branch_id)
    .bind(start_date)
    .bind(end_date)
    .bind(price)
    .bind(discount)
    .bind(final_amount)
    .execute(&mut **conn)
    .await?;

    fetch_one(&mut conn, id).await
}

/// Body for recording the payment that activates a pending membership.
#[derive(Debug, Deserialize)]
pub struct PayMembershipRequest {
    /// Tax applied to the membership's final amount.
    pub tax_amount: Option<Decimal>,
    /// External payment reference (gateway transaction id, receipt number).
    pub payment_ref: Option<String>,
}

/// `POST /api/memberships/:id/pay`: record payment and activate the membership.
///
/// # Errors
/// Returns [`AppError::not_found`] if the membership doesn't exist, or propagates
/// database errors.
pub async fn pay(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(id): Path<Uuid>,
    Json(body): Json<PayMembershipRequest>,
) -> AppResult<Json<MembershipDto>> {
    require_role(&ctx.principal, &[Role::Staff, Role::BranchManager, Role::GymOwner])?;
    let gym_id = GymScope::required(&ctx.principal)?;
    let mut conn = ctx.tenant_db()?.lock().await;

    let (user_id, final_amount): (Uuid, Decimal) =
        sqlx::query_as("SELECT user_id, final_amount FROM memberships WHERE id = $1 AND is_deleted = false")
            .bind(id)
            .fetch_optional(&mut **conn)
            .await?
            .ok_or_else(|| AppError::not_found("membership"))?;
    let (plan_name,): (String,) = sqlx::query_as(
        "SELECT p.name FROM plans p JOIN memberships m ON m.plan_id = p.id WHERE m.id = $1",
    )
    .bind(id)
    .fetch_one(&mut **conn)
    .await?;

    let tax = body.tax_amount.unwrap_or(Decimal::ZERO);
    membership::record_payment(&mut conn, id, final_amount, tax, Decimal::ZERO, body.payment_ref.as_deref()).await?;
    membership::activate_after_payment(&mut conn, &state.notifications, gym_id, id, user_id, &plan_name).await?;

    fetch_one(&mut conn, id).await
}

/// Body for cancelling an active or pending membership.
#[derive(Debug, Deserialize)]
pub struct CancelMembershipRequest {
    /// One of `cancellation_reasons.code`.
    pub cancellation_reason_code: String,
}

/// `POST /api/memberships/:id/cancel`.
///
/// # Errors
/// Returns [`AppError::conflict`] if the membership is already cancelled or expired.
pub async fn cancel(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelMembershipRequest>,
) -> AppResult<Json<MembershipDto>> {
    require_role(&ctx.principal, &[Role::Staff, Role::BranchManager, Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;
    membership::cancel(&mut conn, id, &body.cancellation_reason_code).await?;
    fetch_one(&mut conn, id).await
}

/// Query parameters for listing memberships.
#[derive(Debug, Deserialize)]
pub struct MembershipQuery {
    /// Filter to one member.
    pub user_id: Option<Uuid>,
    /// Filter to one lifecycle status.
    pub status: Option<String>,
    #[serde(flatten)]
    pagination: PaginationQuery,
}

/// `GET /api/memberships`.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn list(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Query(query): Query<MembershipQuery>,
) -> AppResult<Page<MembershipDto>> {
    GymScope::required(&ctx.principal)?;
    let pagination = Pagination::from_query(&query.pagination);
    let mut conn = ctx.tenant_db()?.lock().await;

    let mut clauses = Vec::new();
    if let Some(user_id) = query.user_id {
        clauses.push(FilterClause { column: "user_id", op: FilterOp::Eq, value: FilterValue::Uuid(user_id) });
    }
    if let Some(status) = &query.status {
        clauses.push(FilterClause { column: "status", op: FilterOp::Eq, value: FilterValue::Text(status.clone()) });
    }

    let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM memberships");
    FilterBuilder::apply(&mut count_builder, &clauses, None, false);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut **conn).await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, user_id, plan_id, status, start_date, end_date, final_amount, created_at FROM memberships",
    );
    FilterBuilder::apply(&mut builder, &clauses, None, false);
    builder.push(" ORDER BY created_at DESC");
    if !pagination.no_pagination {
        builder.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset());
    }
    let rows: Vec<MembershipDto> = builder.build_query_as().fetch_all(&mut **conn).await?;

    Ok(Page::new(rows, PaginationMeta::new(&pagination, total)))
}

async fn fetch_one(
    conn: &mut sqlx::pool::PoolConnection<Postgres>,
    id: Uuid,
) -> AppResult<Json<MembershipDto>> {
    let row: MembershipDto = sqlx::query_as(
        "SELECT id, user_id, plan_id, status, start_date, end_date, final_amount, created_at
         FROM memberships WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&mut **conn)
    .await?;
    Ok(Json(row))
}
