// ABOUTME: Dual-backend notification storage (tenant + main "system") with semantic helpers
// ABOUTME: Real-time fan-out is best-effort: a push failure never fails the underlying write
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod gateway;

pub use gateway::{BroadcastGateway, PushGateway};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::pagination::{Page, Pagination, PaginationMeta};

/// One notification row, as read back from either the tenant or main notification table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationRow {
    /// Row id.
    pub id: Uuid,
    /// Recipient. `None` for broadcast/system-wide notifications.
    pub user_id: Option<Uuid>,
    /// Notification type code, e.g. `MEMBERSHIP_EXPIRY`.
    pub notification_type: String,
    /// Display title.
    pub title: String,
    /// Display body.
    pub body: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it stops being returned by reads, if ever.
    pub expires_at: Option<DateTime<Utc>>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

/// Storage and fan-out for both tenant in-app notifications and main-schema system
/// notifications.
#[derive(Clone)]
pub struct NotificationHub {
    main_pool: PgPool,
    gateway: BroadcastGateway,
}

impl NotificationHub {
    /// Build a hub over the main pool and a real-time fan-out gateway.
    #[must_use]
    pub fn new(main_pool: PgPool, gateway: BroadcastGateway) -> Self {
        Self { main_pool, gateway }
    }

    /// Insert one tenant notification and best-effort fan it out over the gateway.
    ///
    /// # Errors
    /// Propagates database errors from the insert. Fan-out failures are logged, not
    /// returned.
    pub async fn create_tenant(
        &self,
        conn: &mut PoolConnection<Postgres>,
        gym_id: Uuid,
        user_id: Option<Uuid>,
        notification_type: &str,
        title: &str,
        body: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notifications (id, user_id, notification_type, title, body, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(user_id)
        .bind(notification_type)
        .bind(title)
        .bind(body)
        .bind(expires_at)
        .execute(&mut **conn)
        .await?;

        self.gateway
            .emit(
                gym_id,
                "notificationCreated",
                serde_json::json!({ "id": id, "type": notification_type }),
            )
            .await;
        Ok(id)
    }

    /// Insert many tenant notifications in one batched `INSERT ... VALUES`.
    ///
    /// # Errors
    /// Propagates database errors. Partial batches are not supported: the whole batch
    /// either commits or the caller's surrounding transaction rolls it back.
    pub async fn create_tenant_bulk(
        &self,
        conn: &mut PoolConnection<Postgres>,
        gym_id: Uuid,
        notifications: &[(Option<Uuid>, &str, &str, &str, Option<DateTime<Utc>>)],
    ) -> AppResult<()> {
        if notifications.is_empty() {
            return Ok(());
        }
        let mut builder: sqlx::QueryBuilder<Postgres> = sqlx::QueryBuilder::new(
            "INSERT INTO notifications (id, user_id, notification_type, title, body, expires_at) ",
        );
        builder.push_values(notifications, |mut row, (user_id, kind, title, body, expires_at)| {
            row.push_bind(Uuid::new_v4())
                .push_bind(*user_id)
                .push_bind(*kind)
                .push_bind(*title)
                .push_bind(*body)
                .push_bind(*expires_at);
        });
        builder.build().execute(&mut **conn).await?;
        self.gateway
            .emit(gym_id, "notificationsCreated", serde_json::json!({ "count": notifications.len() }))
            .await;
        Ok(())
    }

    /// Read a page of tenant notifications for `user_id`, always excluding expired rows.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn list_tenant(
        &self,
        conn: &mut PoolConnection<Postgres>,
        user_id: Uuid,
        unread_only: bool,
        notification_type: Option<&str>,
        pagination: &Pagination,
    ) -> AppResult<Page<NotificationRow>> {
        let mut count_builder: sqlx::QueryBuilder<Postgres> = sqlx::QueryBuilder::new(
            "SELECT COUNT(*) FROM notifications WHERE (user_id = ",
        );
        count_builder.push_bind(user_id).push(" OR user_id IS NULL) AND (expires_at IS NULL OR expires_at > now())");
        if unread_only {
            count_builder.push(" AND is_read = false");
        }
        if let Some(kind) = notification_type {
            count_builder.push(" AND notification_type = ").push_bind(kind);
        }
        let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut **conn).await?;

        let mut data_builder: sqlx::QueryBuilder<Postgres> = sqlx::QueryBuilder::new(
            "SELECT id, user_id, notification_type, title, body, is_read, expires_at, created_at
             FROM notifications WHERE (user_id = ",
        );
        data_builder.push_bind(user_id).push(" OR user_id IS NULL) AND (expires_at IS NULL OR expires_at > now())");
        if unread_only {
            data_builder.push(" AND is_read = false");
        }
        if let Some(kind) = notification_type {
            data_builder.push(" AND notification_type = ").push_bind(kind);
        }
        data_builder.push(" ORDER BY created_at DESC");
        if !pagination.no_pagination {
            data_builder.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset());
        }
        let rows: Vec<NotificationRow> = data_builder.build_query_as().fetch_all(&mut **conn).await?;

        Ok(Page::new(rows, PaginationMeta::new(pagination, total)))
    }

    /// Mark one notification read.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn mark_as_read(&self, conn: &mut PoolConnection<Postgres>, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
            .bind(id)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }

    /// Mark every notification for `user_id` read.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn mark_all_as_read(&self, conn: &mut PoolConnection<Postgres>, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false")
            .bind(user_id)
            .execute(&mut **conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete one notification.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn delete(&self, conn: &mut PoolConnection<Postgres>, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }

    /// Permanently delete read notifications older than `older_than_days`.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn delete_old(&self, conn: &mut PoolConnection<Postgres>, older_than_days: i64) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let result = sqlx::query("DELETE FROM notifications WHERE is_read = true AND created_at < $1")
            .bind(cutoff)
            .execute(&mut **conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Record a main-schema system notification, scoped to a gym or platform-wide.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn create_system(
        &self,
        gym_id: Option<Uuid>,
        notification_type: &str,
        title: &str,
        body: &str,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO system_notifications (id, gym_id, notification_type, title, body)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(gym_id)
        .bind(notification_type)
        .bind(title)
        .bind(body)
        .execute(&self.main_pool)
        .await?;
        Ok(id)
    }

    /// Semantic helper: a membership renewal succeeded.
    ///
    /// # Errors
    /// Propagates database errors from the insert.
    pub async fn notify_membership_renewed(
        &self,
        conn: &mut PoolConnection<Postgres>,
        gym_id: Uuid,
        user_id: Uuid,
        plan_name: &str,
    ) -> AppResult<Uuid> {
        self.create_tenant(
            conn,
            gym_id,
            Some(user_id),
            "MEMBERSHIP_RENEWED",
            "Membership renewed",
            &format!("Your {plan_name} membership has been renewed."),
            None,
        )
        .await
    }

    /// Semantic helper: a membership is approaching its end date. Priority escalates as
    /// `days_remaining` shrinks but the caller still supplies the computed priority so
    /// the threshold policy (T-7/T-3/T-1) lives with the scheduler job that calls this.
    ///
    /// # Errors
    /// Propagates database errors from the insert.
    pub async fn notify_membership_expiry(
        &self,
        conn: &mut PoolConnection<Postgres>,
        gym_id: Uuid,
        user_id: Uuid,
        days_remaining: i64,
    ) -> AppResult<Uuid> {
        self.create_tenant(
            conn,
            gym_id,
            Some(user_id),
            "MEMBERSHIP_EXPIRY",
            "Membership expiring soon",
            &format!("Your membership expires in {days_remaining} day(s)."),
            None,
        )
        .await
    }

    /// Semantic helper: a new announcement was published.
    ///
    /// # Errors
    /// Propagates database errors from the insert.
    pub async fn notify_new_announcement(
        &self,
        conn: &mut PoolConnection<Postgres>,
        gym_id: Uuid,
        user_id: Uuid,
        title: &str,
        body: &str,
    ) -> AppResult<Uuid> {
        self.create_tenant(conn, gym_id, Some(user_id), "ANNOUNCEMENT", title, body, None)
            .await
    }

    /// Access the underlying gateway, for callers (pipelines) that emit events without a
    /// backing notification row.
    #[must_use]
    pub const fn gateway(&self) -> &BroadcastGateway {
        &self.gateway
    }
}

/// Opaque JSON payload shape used by every real-time event.
pub type EventPayload = Value;
