// ABOUTME: Soft-delete predicate and delete-stamp helpers shared by every tenant table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use uuid::Uuid;

use crate::errors::AppResult;

/// Soft-delete helpers. Every tenant table with an `is_deleted` column should route its
/// deletions through [`SoftDelete::delete`] rather than hand-rolling the `UPDATE`.
pub struct SoftDelete;

impl SoftDelete {
    /// Mark one row deleted: `is_deleted = true, deleted_at = now(), deleted_by = actor`.
    /// Returns the number of rows affected (0 if the id didn't exist or was already
    /// deleted).
    ///
    /// # Errors
    /// Propagates any database error.
    pub async fn delete(
        conn: &mut PoolConnection<Postgres>,
        table: &str,
        id: Uuid,
        actor: Uuid,
    ) -> AppResult<u64> {
        let sql = format!(
            "UPDATE {table} SET is_deleted = true, deleted_at = now(), deleted_by = $1
             WHERE id = $2 AND is_deleted = false"
        );
        let result = sqlx::query(&sql).bind(actor).bind(id).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// Restore a soft-deleted row, clearing the deletion stamp.
    ///
    /// # Errors
    /// Propagates any database error.
    pub async fn restore(
        conn: &mut PoolConnection<Postgres>,
        table: &str,
        id: Uuid,
    ) -> AppResult<u64> {
        let sql = format!(
            "UPDATE {table} SET is_deleted = false, deleted_at = NULL, deleted_by = NULL
             WHERE id = $1 AND is_deleted = true"
        );
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        Ok(result.rows_affected())
    }
}

/// Deletion stamp read back from a soft-deleted row, for audit display.
#[derive(Debug, Clone)]
pub struct DeletionStamp {
    /// When the row was deleted.
    pub deleted_at: DateTime<Utc>,
    /// Who deleted it.
    pub deleted_by: Uuid,
}
