// ABOUTME: Read-only achievement catalog and one member's earned achievements
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::GymScope;
use crate::context::RequestContext;
use crate::errors::AppResult;

/// One achievement definition.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AchievementDto {
    /// Achievement id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Qualification criteria, e.g. `{"type": "total_visits", "value": 10}`.
    pub criteria: Value,
}

/// `GET /api/achievements`: the full catalog, no pagination since the set is small and
/// rarely grows past a few dozen entries.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn catalog(Extension(ctx): Extension<Arc<RequestContext>>) -> AppResult<Json<Vec<AchievementDto>>> {
    GymScope::required(&ctx.principal)?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let rows: Vec<AchievementDto> =
        sqlx::query_as("SELECT id, name, criteria FROM achievements WHERE is_deleted = false ORDER BY name")
            .fetch_all(&mut **conn)
            .await?;
    Ok(Json(rows))
}

/// One earned achievement, joined with its definition for display.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct EarnedAchievementDto {
    /// Achievement id.
    pub achievement_id: Uuid,
    /// Display name.
    pub name: String,
    /// When the member earned it.
    pub earned_at: DateTime<Utc>,
}

/// Query parameters for listing a member's earned achievements.
#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    /// Member whose achievements to list. Defaults to the caller.
    pub user_id: Option<Uuid>,
}

/// `GET /api/achievements/mine`: a member's earned achievements, most recent first.
///
/// # Errors
/// Propagates database errors or a missing tenant context.
pub async fn mine(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Vec<EarnedAchievementDto>>> {
    let user_id = GymScope::effective_user_id(&ctx.principal, query.user_id)?;
    let mut conn = ctx.tenant_db()?.lock().await;
    let rows: Vec<EarnedAchievementDto> = sqlx::query_as(
        "SELECT ua.achievement_id, a.name, ua.earned_at FROM user_achievements ua
         JOIN achievements a ON a.id = ua.achievement_id
         WHERE ua.user_id = $1 ORDER BY ua.earned_at DESC",
    )
    .bind(user_id)
    .fetch_all(&mut **conn)
    .await?;
    Ok(Json(rows))
}
