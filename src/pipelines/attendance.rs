// ABOUTME: Attendance-marked pipeline: streak, challenge progress, achievements, loyalty, engagement
// ABOUTME: The attendance row itself must commit; every downstream step is best-effort and logs on failure
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use uuid::Uuid;

use crate::errors::AppResult;

use super::engagement::{self, EngagementInputs};
use super::loyalty::{self, AwardSource};

/// Streak type for ordinary gym visits.
pub const DAILY_VISIT: &str = "daily_visit";

/// Pure streak transition: given the previous count and the gap since the last event,
/// compute the new current and longest counts. `1` if this is the first event of the
/// day or the gap is more than one day; `prev + 1` if the gap is exactly one day.
#[must_use]
pub fn next_streak(
    prev_current: i32,
    prev_longest: i32,
    last_event_date: Option<NaiveDate>,
    event_date: NaiveDate,
) -> (i32, i32) {
    let new_current = match last_event_date {
        Some(last) if last == event_date => prev_current.max(1),
        Some(last) if event_date.signed_duration_since(last).num_days() == 1 => prev_current + 1,
        _ => 1,
    };
    (new_current, prev_longest.max(new_current))
}

/// Record one attendance check-in, then run the four derived-state steps. The insert
/// itself propagates errors; each subsequent step is isolated and only logged on
/// failure, per the "attendance recording must never fail for an ancillary write" rule.
///
/// # Errors
/// Propagates only errors from the attendance insert itself.
pub async fn record(
    conn: &mut PoolConnection<Postgres>,
    user_id: Uuid,
    branch_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let attendance_id = Uuid::new_v4();
    sqlx::query("INSERT INTO attendance (id, user_id, branch_id) VALUES ($1, $2, $3)")
        .bind(attendance_id)
        .bind(user_id)
        .bind(branch_id)
        .execute(&mut **conn)
        .await?;

    let event_date = Utc::now().date_naive();

    if let Err(err) = update_streak(conn, user_id, event_date).await {
        tracing::warn!(user_id = %user_id, error = %err, "streak update failed, continuing");
    }
    if let Err(err) = update_challenge_progress(conn, user_id).await {
        tracing::warn!(user_id = %user_id, error = %err, "challenge progress update failed, continuing");
    }
    if let Err(err) = evaluate_achievements(conn, user_id).await {
        tracing::warn!(user_id = %user_id, error = %err, "achievement evaluation failed, continuing");
    }
    if let Err(err) = loyalty::award_points(conn, user_id, AwardSource::Visit, Some(&attendance_id.to_string()), None).await {
        tracing::warn!(user_id = %user_id, error = %err, "loyalty award failed, continuing");
    }
    if let Err(err) = recompute_engagement(conn, user_id).await {
        tracing::warn!(user_id = %user_id, error = %err, "engagement recompute failed, continuing");
    }

    Ok(attendance_id)
}

async fn update_streak(conn: &mut PoolConnection<Postgres>, user_id: Uuid, event_date: NaiveDate) -> AppResult<()> {
    let existing: Option<(i32, i32, Option<NaiveDate>)> = sqlx::query_as(
        "SELECT current_count, longest_count, last_event_date FROM streaks WHERE user_id = $1 AND streak_type = $2",
    )
    .bind(user_id)
    .bind(DAILY_VISIT)
    .fetch_optional(&mut **conn)
    .await?;

    let (prev_current, prev_longest, last_event_date) = existing.unwrap_or((0, 0, None));
    let (current, longest) = next_streak(prev_current, prev_longest, last_event_date, event_date);

    sqlx::query(
        "INSERT INTO streaks (user_id, streak_type, current_count, longest_count, last_event_date)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, streak_type) DO UPDATE
            SET current_count = $3, longest_count = $4, last_event_date = $5",
    )
    .bind(user_id)
    .bind(DAILY_VISIT)
    .bind(current)
    .bind(longest)
    .bind(event_date)
    .execute(&mut **conn)
    .await?;
    Ok(())
}

async fn update_challenge_progress(conn: &mut PoolConnection<Postgres>, user_id: Uuid) -> AppResult<()> {
    let rows: Vec<(Uuid, f64, f64)> = sqlx::query_as(
        "SELECT cp.challenge_id, cp.current_value, c.goal
         FROM challenge_participants cp
         JOIN challenges c ON c.id = cp.challenge_id
         WHERE cp.user_id = $1 AND c.metric IN ('attendance', 'visits') AND c.status = 'active'",
    )
    .bind(user_id)
    .fetch_all(&mut **conn)
    .await?;

    for (challenge_id, current_value, goal) in rows {
        let new_value = current_value + 1.0;
        let progress = if goal > 0.0 { (new_value / goal * 100.0).clamp(0.0, 100.0) } else { 100.0 };
        sqlx::query(
            "UPDATE challenge_participants SET current_value = $1, progress_pct = $2
             WHERE challenge_id = $3 AND user_id = $4",
        )
        .bind(new_value)
        .bind(progress)
        .bind(challenge_id)
        .bind(user_id)
        .execute(&mut **conn)
        .await?;
    }
    Ok(())
}

async fn evaluate_achievements(conn: &mut PoolConnection<Postgres>, user_id: Uuid) -> AppResult<()> {
    let (total_visits,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE user_id = $1 AND is_deleted = false")
        .bind(user_id)
        .fetch_one(&mut **conn)
        .await?;
    let (streak_days,): (Option<i32>,) =
        sqlx::query_as("SELECT current_count FROM streaks WHERE user_id = $1 AND streak_type = $2")
            .bind(user_id)
            .bind(DAILY_VISIT)
            .fetch_optional(&mut **conn)
            .await?
            .unwrap_or((None,));
    let streak_days = streak_days.unwrap_or(0);

    let achievements: Vec<(Uuid, Value)> = sqlx::query_as("SELECT id, criteria FROM achievements WHERE is_deleted = false")
        .fetch_all(&mut **conn)
        .await?;

    for (achievement_id, criteria) in achievements {
        let qualifies = match (criteria.get("type").and_then(Value::as_str), criteria.get("value").and_then(Value::as_i64)) {
            (Some("total_visits"), Some(value)) => total_visits >= value,
            (Some("streak_days"), Some(value)) => i64::from(streak_days) >= value,
            _ => false,
        };
        if qualifies {
            sqlx::query(
                "INSERT INTO user_achievements (user_id, achievement_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(achievement_id)
            .execute(&mut **conn)
            .await?;
        }
    }
    Ok(())
}

async fn recompute_engagement(conn: &mut PoolConnection<Postgres>, user_id: Uuid) -> AppResult<()> {
    let (total_visits,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE user_id = $1 AND is_deleted = false")
        .bind(user_id)
        .fetch_one(&mut **conn)
        .await?;
    let (streak_days,): (Option<i32>,) =
        sqlx::query_as("SELECT current_count FROM streaks WHERE user_id = $1 AND streak_type = $2")
            .bind(user_id)
            .bind(DAILY_VISIT)
            .fetch_optional(&mut **conn)
            .await?
            .unwrap_or((None,));
    let streak_days = streak_days.unwrap_or(0);

    let visit_frequency = (f64::from(streak_days) * 10.0).min(100.0);
    let inputs = EngagementInputs {
        visit_frequency,
        visit_recency: 100.0,
        attendance_trend: (total_visits as f64 * 2.0).min(100.0),
        payment_reliability: 100.0,
        membership_tenure: 50.0,
        engagement_depth: 50.0,
    };
    engagement::recompute(conn, user_id, inputs).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn first_event_starts_streak_at_one() {
        let (current, longest) = next_streak(0, 0, None, date(2024, 6, 10));
        assert_eq!((current, longest), (1, 1));
    }

    #[test]
    fn consecutive_day_increments() {
        let (current, longest) = next_streak(1, 1, Some(date(2024, 6, 10)), date(2024, 6, 11));
        assert_eq!((current, longest), (2, 2));
    }

    #[test]
    fn gap_day_resets_to_one() {
        let (current, longest) = next_streak(2, 2, Some(date(2024, 6, 11)), date(2024, 6, 13));
        assert_eq!((current, longest), (1, 2));
    }

    #[test]
    fn same_day_twice_does_not_double_increment() {
        let (current, _) = next_streak(1, 1, Some(date(2024, 6, 10)), date(2024, 6, 10));
        assert_eq!(current, 1);
    }

    #[test]
    fn scenario_e2_matches_spec() {
        let (c1, l1) = next_streak(0, 0, None, date(2024, 6, 10));
        let (c2, l2) = next_streak(c1, l1, Some(date(2024, 6, 10)), date(2024, 6, 11));
        let (c3, l3) = next_streak(c2, l2, Some(date(2024, 6, 11)), date(2024, 6, 13));
        assert_eq!((c3, l3), (1, 2));
    }
}
