// ABOUTME: Versioned, content-hashed migration engine for both the main and tenant schema families
// ABOUTME: Each step runs in its own savepoint; a failed step does not poison earlier ones
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod main_steps;
mod tenant_steps;

use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::errors::{AppError, AppResult};

/// One migration to apply: a 3-digit ordinal, a snake_case name, and the SQL body.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Monotonic 3-digit ordinal, e.g. `1` for `001_create_users`.
    pub ordinal: u32,
    /// snake_case step name, used in the log and for the `001_name` display id.
    pub name: &'static str,
    /// Raw SQL executed inside the step's savepoint.
    pub sql: &'static str,
}

impl MigrationStep {
    /// The `NNN_snake_case_name` identifier recorded in `migration_log`.
    #[must_use]
    pub fn display_id(&self) -> String {
        format!("{:03}_{}", self.ordinal, self.name)
    }

    /// SHA-256 hex digest of this step's SQL body, used for drift detection.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(self.sql.as_bytes());
        hex_encode(&digest)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // write! to a String never fails
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Which family of migrations to apply and, for tenant migrations, which schema.
pub enum MigrationFamily {
    /// The `public` schema migrations, applied once at process startup.
    Main,
    /// One tenant schema's migrations, applied when the schema is created or reconciled.
    Tenant(String),
}

/// Apply every step of a migration family that has not yet been recorded, in ordinal
/// order. Each step runs inside its own `SAVEPOINT`; if a step fails, earlier steps in
/// the same call remain committed and the error is returned to the caller.
///
/// # Errors
/// Returns [`AppError::conflict`] if an already-applied step's content hash no longer
/// matches the step's current SQL (drift), or [`AppError`] for any database failure.
pub async fn run(main_pool: &PgPool, family: MigrationFamily) -> AppResult<()> {
    let (log_schema, steps): (String, Vec<MigrationStep>) = match &family {
        MigrationFamily::Main => ("public".to_owned(), main_steps::steps()),
        MigrationFamily::Tenant(schema) => (schema.clone(), tenant_steps::steps()),
    };

    ensure_migration_log_table(main_pool, &log_schema).await?;

    for step in steps {
        apply_step(main_pool, &log_schema, &step).await?;
    }
    Ok(())
}

async fn ensure_migration_log_table(pool: &PgPool, schema: &str) -> AppResult<()> {
    let qualified = qualify(schema, "migration_log");
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {qualified} (
            id BIGSERIAL PRIMARY KEY,
            step_id TEXT NOT NULL UNIQUE,
            content_hash TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"
    ))
    .execute(pool)
    .await?;
    Ok(())
}

async fn apply_step(pool: &PgPool, schema: &str, step: &MigrationStep) -> AppResult<()> {
    let log_table = qualify(schema, "migration_log");
    let step_id = step.display_id();
    let hash = step.content_hash();

    let existing: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT content_hash FROM {log_table} WHERE step_id = $1"
    ))
    .bind(&step_id)
    .fetch_optional(pool)
    .await?;

    if let Some((recorded_hash,)) = existing {
        if recorded_hash != hash {
            return Err(AppError::conflict(format!(
                "migration step {step_id} has drifted: recorded hash {recorded_hash} != current {hash}"
            )));
        }
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("SET LOCAL search_path TO \"{schema}\""))
        .execute(&mut *tx)
        .await?;
    sqlx::query("SAVEPOINT step").execute(&mut *tx).await?;

    let body_result = sqlx::query(step.sql).execute(&mut *tx).await;
    match body_result {
        Ok(_) => {
            sqlx::query("RELEASE SAVEPOINT step")
                .execute(&mut *tx)
                .await?;
        }
        Err(err) => {
            sqlx::query("ROLLBACK TO SAVEPOINT step")
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(AppError::from(err));
        }
    }

    sqlx::query(&format!(
        "INSERT INTO {log_table} (step_id, content_hash) VALUES ($1, $2)"
    ))
    .bind(&step_id)
    .bind(&hash)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::debug!(step = %step_id, schema = %schema, "migration step applied");
    Ok(())
}

fn qualify(schema: &str, table: &str) -> String {
    format!("\"{schema}\".\"{table}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_id_is_zero_padded() {
        let step = MigrationStep {
            ordinal: 7,
            name: "add_index",
            sql: "SELECT 1",
        };
        assert_eq!(step.display_id(), "007_add_index");
    }

    #[test]
    fn content_hash_changes_with_sql() {
        let a = MigrationStep {
            ordinal: 1,
            name: "x",
            sql: "SELECT 1",
        };
        let b = MigrationStep {
            ordinal: 1,
            name: "x",
            sql: "SELECT 2",
        };
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
