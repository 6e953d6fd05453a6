// ABOUTME: Attendance check-in endpoint and per-user history, thin wrappers over the attendance pipeline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::GymScope;
use crate::context::RequestContext;
use crate::errors::AppResult;
use crate::kernel::{FilterBuilder, FilterClause, FilterOp, FilterValue};
use crate::pagination::{Page, Pagination, PaginationMeta, PaginationQuery};
use crate::pipelines::attendance as attendance_pipeline;

/// Body for checking a member in.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Member being checked in. Defaults to the caller for self check-in.
    pub user_id: Option<Uuid>,
    /// Branch the check-in happened at, if the gym tracks branches.
    pub branch_id: Option<Uuid>,
}

/// Response for a successful check-in.
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    /// The created attendance row's id.
    pub attendance_id: Uuid,
}

/// `POST /api/attendance/check-in`.
///
/// # Errors
/// Returns [`AppError::forbidden`] if the caller tries to check in someone else without
/// delegation rights, or propagates database errors from the attendance insert.
pub async fn check_in(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<CheckInRequest>,
) -> AppResult<Json<CheckInResponse>> {
    let user_id = GymScope::effective_user_id(&ctx.principal, body.user_id)?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let attendance_id = attendance_pipeline::record(&mut conn, user_id, body.branch_id).await?;
    Ok(Json(CheckInResponse { attendance_id }))
}

/// One attendance row as returned to clients.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AttendanceDto {
    /// Row id.
    pub id: Uuid,
    /// Member who checked in.
    pub user_id: Uuid,
    /// Branch checked in at, if recorded.
    pub branch_id: Option<Uuid>,
    /// Check-in timestamp.
    pub checked_in_at: DateTime<Utc>,
}

/// Query parameters for listing attendance history.
#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    /// Filter to one member. Defaults to the caller for members listing their own history.
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pagination: PaginationQuery,
}

/// `GET /api/attendance`: paginated check-in history, optionally filtered to one member.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn list(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<Page<AttendanceDto>> {
    let target_user = GymScope::effective_user_id(&ctx.principal, query.user_id)?;
    let pagination = Pagination::from_query(&query.pagination);
    let mut conn = ctx.tenant_db()?.lock().await;

    let clauses = [FilterClause {
        column: "user_id",
        op: FilterOp::Eq,
        value: FilterValue::Uuid(target_user),
    }];

    let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM attendance");
    FilterBuilder::apply(&mut count_builder, &clauses, None, false);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut **conn).await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, user_id, branch_id, checked_in_at FROM attendance");
    FilterBuilder::apply(&mut builder, &clauses, None, false);
    builder.push(" ORDER BY checked_in_at DESC");
    if !pagination.no_pagination {
        builder.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset());
    }
    let rows: Vec<AttendanceDto> = builder.build_query_as().fetch_all(&mut **conn).await?;

    Ok(Page::new(rows, PaginationMeta::new(&pagination, total)))
}
