// ABOUTME: Membership lifecycle pipeline: payment recording, renewal/expiry notifications, cancellation history
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::notifications::NotificationHub;

/// Thresholds, in whole days remaining, at which an expiry notification fires.
pub const EXPIRY_NOTICE_THRESHOLDS: [i64; 3] = [7, 3, 1];

/// Record a payment against a membership and always create exactly one payment row.
///
/// # Errors
/// Returns [`AppError::unprocessable`] if `amount + tax_amount - discount_amount !=
/// net_amount` (caller-computed mismatch caught before it reaches the database check
/// constraint), or propagates any database error.
pub async fn record_payment(
    conn: &mut PoolConnection<Postgres>,
    membership_id: Uuid,
    amount: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
    payment_ref: Option<&str>,
) -> AppResult<Uuid> {
    let net_amount = amount + tax_amount - discount_amount;
    let payment_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO payments (id, membership_id, amount, tax_amount, discount_amount, net_amount, status, payment_ref)
         VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7)",
    )
    .bind(payment_id)
    .bind(membership_id)
    .bind(amount)
    .bind(tax_amount)
    .bind(discount_amount)
    .bind(net_amount)
    .bind(payment_ref)
    .execute(&mut **conn)
    .await?;
    Ok(payment_id)
}

/// Activate a membership after a successful payment and emit a renewal notification.
/// Notification failures are logged, not propagated — the membership activation itself
/// must not fail for an ancillary write.
///
/// # Errors
/// Propagates database errors from the membership status update.
pub async fn activate_after_payment(
    conn: &mut PoolConnection<Postgres>,
    notifications: &NotificationHub,
    gym_id: Uuid,
    membership_id: Uuid,
    user_id: Uuid,
    plan_name: &str,
) -> AppResult<()> {
    sqlx::query("UPDATE memberships SET status = 'active' WHERE id = $1")
        .bind(membership_id)
        .execute(&mut **conn)
        .await?;

    if let Err(err) = notifications
        .notify_membership_renewed(conn, gym_id, user_id, plan_name)
        .await
    {
        tracing::warn!(membership_id = %membership_id, error = %err, "renewal notification failed, continuing");
    }
    Ok(())
}

/// Cancel a membership, writing a `membership_history` row with the cancellation
/// reason. Rejects cancelling an already-terminal membership.
///
/// # Errors
/// Returns [`AppError::conflict`] if the membership is already `cancelled` or
/// `expired`. Propagates database errors otherwise.
pub async fn cancel(
    conn: &mut PoolConnection<Postgres>,
    membership_id: Uuid,
    cancellation_reason_code: &str,
) -> AppResult<()> {
    let (status,): (String,) = sqlx::query_as("SELECT status FROM memberships WHERE id = $1")
        .bind(membership_id)
        .fetch_one(&mut **conn)
        .await?;
    if status == "cancelled" || status == "expired" {
        return Err(AppError::conflict(format!(
            "membership {membership_id} is already {status}"
        )));
    }

    sqlx::query("UPDATE memberships SET status = 'cancelled' WHERE id = $1")
        .bind(membership_id)
        .execute(&mut **conn)
        .await?;

    sqlx::query(
        "INSERT INTO membership_history (id, membership_id, archive_reason, cancellation_reason_code)
         VALUES ($1, $2, 'cancelled', $3)",
    )
    .bind(Uuid::new_v4())
    .bind(membership_id)
    .bind(cancellation_reason_code)
    .execute(&mut **conn)
    .await?;
    Ok(())
}

/// Sweep memberships whose `end_date` has passed and mark them expired, writing a
/// history row for each. Used by the hourly scheduler job.
///
/// # Errors
/// Propagates database errors.
pub async fn expire_past_due(conn: &mut PoolConnection<Postgres>, today: NaiveDate) -> AppResult<u64> {
    let expired: Vec<(Uuid,)> = sqlx::query_as(
        "UPDATE memberships SET status = 'expired'
         WHERE status = 'active' AND end_date < $1 AND is_deleted = false
         RETURNING id",
    )
    .bind(today)
    .fetch_all(&mut **conn)
    .await?;

    for (membership_id,) in &expired {
        sqlx::query(
            "INSERT INTO membership_history (id, membership_id, archive_reason) VALUES ($1, $2, 'expired')",
        )
        .bind(Uuid::new_v4())
        .bind(membership_id)
        .execute(&mut **conn)
        .await?;
    }
    Ok(expired.len() as u64)
}

/// Emit expiry notifications for memberships crossing the T-7/T-3/T-1 day thresholds.
/// Notification failures are logged per-membership and do not abort the sweep.
pub async fn notify_upcoming_expiries(
    conn: &mut PoolConnection<Postgres>,
    notifications: &NotificationHub,
    gym_id: Uuid,
    today: NaiveDate,
) {
    for days in EXPIRY_NOTICE_THRESHOLDS {
        let target_date = today + chrono::Duration::days(days);
        let rows: Result<Vec<(Uuid, Uuid)>, _> = sqlx::query_as(
            "SELECT id, user_id FROM memberships WHERE status = 'active' AND end_date = $1 AND is_deleted = false",
        )
        .bind(target_date)
        .fetch_all(&mut **conn)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!(error = %err, days, "failed to query memberships for expiry notice");
                continue;
            }
        };

        for (membership_id, user_id) in rows {
            if let Err(err) = notifications
                .notify_membership_expiry(conn, gym_id, user_id, days)
                .await
            {
                tracing::warn!(membership_id = %membership_id, error = %err, "expiry notification failed, continuing");
            }
        }
    }
}
