// ABOUTME: The six standard per-tenant recurring job bodies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::future::Future;
use std::pin::Pin;

use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::context::AppState;
use crate::errors::AppResult;
use crate::pipelines::{engagement, loyalty, membership};

type BoxedJob = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;

/// Monthly: for every `is_recurring` salary from last month, create this month's pending
/// salary, skipping tenants that already have one or whose staff member is inactive.
pub fn recurring_salaries(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(recurring_salaries_impl(state, gym_id))
}

async fn recurring_salaries_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    let now = Utc::now();
    let (this_month, this_year) = (now.month() as i32, now.year());
    let (last_month, last_year) = if this_month == 1 { (12, this_year - 1) } else { (this_month - 1, this_year) };

    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            let recurring: Vec<(Uuid, f64)> = sqlx::query_as(
                "SELECT ss.staff_id, ss.net_amount FROM staff_salaries ss
                 JOIN users u ON u.id = ss.staff_id
                 WHERE ss.is_recurring = true AND ss.month = $1 AND ss.year = $2
                   AND ss.is_deleted = false AND u.is_active = true AND u.is_deleted = false",
            )
            .bind(last_month)
            .bind(last_year)
            .fetch_all(&mut **conn)
            .await?;

            for (staff_id, net_amount) in recurring {
                sqlx::query(
                    "INSERT INTO staff_salaries (id, staff_id, month, year, net_amount, is_recurring, status)
                     SELECT $1, $2, $3, $4, $5, true, 'pending'
                     WHERE NOT EXISTS (
                        SELECT 1 FROM staff_salaries
                        WHERE staff_id = $2 AND month = $3 AND year = $4 AND is_deleted = false
                     )",
                )
                .bind(Uuid::new_v4())
                .bind(staff_id)
                .bind(this_month)
                .bind(this_year)
                .bind(net_amount)
                .execute(&mut **conn)
                .await?;
            }
            Ok(())
        })
        .await
}

/// Daily: deduct and record `expire` transactions for earn transactions past their
/// `expires_at`, flooring the balance at zero.
pub fn loyalty_expiry(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(loyalty_expiry_impl(state, gym_id))
}

async fn loyalty_expiry_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            let expiring: Vec<(Uuid, Uuid, f64)> = sqlx::query_as(
                "SELECT lt.id, lt.user_id, lt.points FROM loyalty_transactions lt
                 WHERE lt.transaction_type = 'earn' AND lt.expires_at < now()
                   AND NOT EXISTS (
                     SELECT 1 FROM loyalty_transactions e
                     WHERE e.transaction_type = 'expire' AND e.reference = lt.id::text
                   )",
            )
            .fetch_all(&mut **conn)
            .await?;

            for (earn_id, user_id, points) in expiring {
                let (current_balance,): (f64,) =
                    sqlx::query_as("SELECT current_balance FROM loyalty_points WHERE user_id = $1")
                        .bind(user_id)
                        .fetch_one(&mut **conn)
                        .await?;
                let deducted = points.min(current_balance);
                let new_balance = (current_balance - deducted).max(0.0);

                sqlx::query(
                    "UPDATE loyalty_points SET current_balance = $1, total_expired = total_expired + $2 WHERE user_id = $3",
                )
                .bind(new_balance)
                .bind(deducted)
                .bind(user_id)
                .execute(&mut **conn)
                .await?;

                sqlx::query(
                    "INSERT INTO loyalty_transactions (id, user_id, transaction_type, points, balance_after, source, reference)
                     VALUES ($1, $2, 'expire', $3, $4, 'expiry_job', $5)",
                )
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(-deducted)
                .bind(new_balance)
                .bind(earn_id.to_string())
                .execute(&mut **conn)
                .await?;
            }
            Ok(())
        })
        .await
}

/// Daily: reassert the correct tier for every loyalty-points row.
pub fn tier_recomputation(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(tier_recomputation_impl(state, gym_id))
}

async fn tier_recomputation_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            let tiers: Vec<loyalty::LoyaltyTier> =
                sqlx::query_as("SELECT id, name, min_points, multiplier FROM loyalty_tiers ORDER BY min_points")
                    .fetch_all(&mut **conn)
                    .await?;
            let accounts: Vec<(Uuid, f64, Option<Uuid>)> =
                sqlx::query_as("SELECT user_id, total_earned, tier_id FROM loyalty_points")
                    .fetch_all(&mut **conn)
                    .await?;

            for (user_id, total_earned, tier_id) in accounts {
                loyalty::check_and_update_tier(conn, user_id, &tiers, total_earned, tier_id).await?;
            }
            Ok(())
        })
        .await
}

/// Daily: recompute the engagement score for every active member.
pub fn engagement_refresh(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(engagement_refresh_impl(state, gym_id))
}

async fn engagement_refresh_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            let members: Vec<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE role = 'member' AND is_active = true AND is_deleted = false")
                    .fetch_all(&mut **conn)
                    .await?;

            for (user_id,) in members {
                let (total_visits,): (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE user_id = $1 AND is_deleted = false")
                        .bind(user_id)
                        .fetch_one(&mut **conn)
                        .await?;
                let inputs = engagement::EngagementInputs {
                    visit_frequency: (total_visits as f64 * 5.0).min(100.0),
                    visit_recency: 50.0,
                    attendance_trend: 50.0,
                    payment_reliability: 80.0,
                    membership_tenure: 50.0,
                    engagement_depth: 50.0,
                };
                if let Err(err) = engagement::recompute(conn, user_id, inputs).await {
                    tracing::warn!(user_id = %user_id, error = %err, "engagement refresh failed for member, continuing");
                }
            }
            Ok(())
        })
        .await
}

/// Hourly: mark memberships whose `end_date` has passed as `expired`.
pub fn membership_expiry_sweep(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(membership_expiry_sweep_impl(state, gym_id))
}

async fn membership_expiry_sweep_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    let today = Utc::now().date_naive();
    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            membership::expire_past_due(conn, today).await?;
            Ok(())
        })
        .await
}

/// Hourly: emit expiry notifications at the T-7/T-3/T-1 day thresholds.
pub fn membership_expiry_notices(state: AppState, gym_id: Uuid) -> BoxedJob {
    Box::pin(membership_expiry_notices_impl(state, gym_id))
}

async fn membership_expiry_notices_impl(state: AppState, gym_id: Uuid) -> AppResult<()> {
    let today = Utc::now().date_naive();
    let notifications = state.notifications.clone();
    state
        .broker
        .with_tenant(gym_id, |conn| async move {
            membership::notify_upcoming_expiries(conn, &notifications, gym_id, today).await;
            Ok(())
        })
        .await
}
