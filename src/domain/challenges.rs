// ABOUTME: Gamification challenges: creation gated behind the `gamification` subscription feature
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{require_features, require_role, GymScope};
use crate::context::{AppState, RequestContext};
use crate::database::SubscriptionRepository;
use crate::errors::AppResult;
use crate::kernel::FilterBuilder;
use crate::pagination::{Page, Pagination, PaginationMeta, PaginationQuery};
use crate::tenant::Role;

/// Subscription feature code gating gamification endpoints.
pub const GAMIFICATION_FEATURE: &str = "gamification";

/// A challenge as returned to clients.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ChallengeDto {
    /// Challenge id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Metric tracked, e.g. `attendance`, `visits`.
    pub metric: String,
    /// Target value participants race toward.
    pub goal: f64,
    /// Lifecycle status: `upcoming`, `active`, `completed`.
    pub status: String,
}

/// Body for creating a challenge.
#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    /// Display name.
    pub name: String,
    /// Metric tracked.
    pub metric: String,
    /// Target value.
    pub goal: f64,
}

/// `POST /api/challenges`: gym owners only, and only on plans with the `gamification`
/// feature enabled.
///
/// # Errors
/// Returns [`AppError::forbidden`] if the role or plan doesn't permit it, or propagates
/// database errors.
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<CreateChallengeRequest>,
) -> AppResult<Json<ChallengeDto>> {
    require_role(&ctx.principal, &[Role::GymOwner])?;
    let gym_id = GymScope::required(&ctx.principal)?;

    let subscriptions = SubscriptionRepository::new(state.main_pool.clone());
    let features = subscriptions.active_features(gym_id).await?;
    require_features(&ctx.principal, features.as_deref(), &[GAMIFICATION_FEATURE])?;

    let mut conn = ctx.tenant_db()?.lock().await;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO challenges (id, name, metric, goal) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&body.name)
        .bind(&body.metric)
        .bind(body.goal)
        .execute(&mut **conn)
        .await?;

    let challenge: ChallengeDto =
        sqlx::query_as("SELECT id, name, metric, goal, status FROM challenges WHERE id = $1")
            .bind(id)
            .fetch_one(&mut **conn)
            .await?;
    Ok(Json(challenge))
}

/// `GET /api/challenges`: visible to every role, no feature gate on reads.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn list(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Page<ChallengeDto>> {
    GymScope::required(&ctx.principal)?;
    let pagination = Pagination::from_query(&query);
    let mut conn = ctx.tenant_db()?.lock().await;

    let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM challenges");
    FilterBuilder::apply(&mut count_builder, &[], None, false);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut **conn).await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, name, metric, goal, status FROM challenges");
    FilterBuilder::apply(&mut builder, &[], None, false);
    builder.push(" ORDER BY status, name");
    if !pagination.no_pagination {
        builder.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset());
    }
    let rows: Vec<ChallengeDto> = builder.build_query_as().fetch_all(&mut **conn).await?;

    Ok(Page::new(rows, PaginationMeta::new(&pagination, total)))
}
