// ABOUTME: Branch CRUD, the simplest tenant table and the template every other domain module follows
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{require_role, GymScope};
use crate::context::RequestContext;
use crate::errors::{AppError, AppResult};
use crate::kernel::{FilterBuilder, SoftDelete};
use crate::pagination::{Page, PaginationMeta, PaginationQuery};
use crate::tenant::Role;

/// A branch as returned to clients.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BranchDto {
    /// Branch id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// When the branch was created.
    pub created_at: DateTime<Utc>,
}

/// `GET /api/branches`: every non-deleted branch for the caller's gym.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn list(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Page<BranchDto>> {
    GymScope::required(&ctx.principal)?;
    let pagination = crate::pagination::Pagination::from_query(&query);
    let mut conn = ctx.tenant_db()?.lock().await;

    let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM branches");
    FilterBuilder::apply(&mut count_builder, &[], None, false);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut **conn).await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, name, created_at FROM branches");
    FilterBuilder::apply(&mut builder, &[], None, false);
    builder.push(" ORDER BY name");
    if !pagination.no_pagination {
        builder.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset());
    }
    let rows: Vec<BranchDto> = builder.build_query_as().fetch_all(&mut **conn).await?;

    Ok(Page::new(rows, PaginationMeta::new(&pagination, total)))
}

/// Body for creating a branch.
#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    /// Display name for the new branch.
    pub name: String,
}

/// `POST /api/branches`: gym owners only.
///
/// # Errors
/// Returns [`AppError::forbidden`] for any role other than gym owner, or propagates
/// database errors.
pub async fn create(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<CreateBranchRequest>,
) -> AppResult<Json<BranchDto>> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO branches (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(&body.name)
        .execute(&mut **conn)
        .await?;

    let branch: BranchDto = sqlx::query_as("SELECT id, name, created_at FROM branches WHERE id = $1")
        .bind(id)
        .fetch_one(&mut **conn)
        .await?;
    Ok(Json(branch))
}

/// Body for renaming a branch.
#[derive(Debug, Deserialize)]
pub struct RenameBranchRequest {
    /// New display name.
    pub name: String,
}

/// `PATCH /api/branches/:id`: gym owners only.
///
/// # Errors
/// Returns [`AppError::not_found`] if the branch doesn't exist or is already deleted.
pub async fn rename(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameBranchRequest>,
) -> AppResult<Json<BranchDto>> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;

    let result = sqlx::query("UPDATE branches SET name = $1 WHERE id = $2 AND is_deleted = false")
        .bind(&body.name)
        .bind(id)
        .execute(&mut **conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("branch"));
    }

    let branch: BranchDto = sqlx::query_as("SELECT id, name, created_at FROM branches WHERE id = $1")
        .bind(id)
        .fetch_one(&mut **conn)
        .await?;
    Ok(Json(branch))
}

/// `DELETE /api/branches/:id`: soft delete, gym owners only.
///
/// # Errors
/// Returns [`AppError::not_found`] if the branch doesn't exist or was already deleted.
pub async fn delete(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(id): Path<Uuid>,
) -> AppResult<()> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let affected = SoftDelete::delete(&mut conn, "branches", id, ctx.principal.user_id).await?;
    if affected == 0 {
        return Err(AppError::not_found("branch"));
    }
    Ok(())
}
