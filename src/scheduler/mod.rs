// ABOUTME: Cron-driven recurring jobs fanned out across every active tenant
// ABOUTME: A Postgres advisory lock ensures at most one instance of a given job runs at a time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod jobs;

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::context::AppState;
use crate::errors::AppResult;

/// Per-tenant soft deadline; exceeding it logs a warning and the sweep moves on.
const PER_TENANT_SOFT_DEADLINE: Duration = Duration::from_secs(30);

/// Advisory lock keys, one per job kind, so at most one process instance runs a given
/// job at a time even when the binary is horizontally scaled.
mod lock_keys {
    pub const RECURRING_SALARIES: i64 = 1_001;
    pub const LOYALTY_EXPIRY: i64 = 1_002;
    pub const TIER_RECOMPUTE: i64 = 1_003;
    pub const ENGAGEMENT_REFRESH: i64 = 1_004;
    pub const MEMBERSHIP_EXPIRY_SWEEP: i64 = 1_005;
    pub const MEMBERSHIP_EXPIRY_NOTICES: i64 = 1_006;
}

/// Try to acquire a session-scoped advisory lock; returns `false` without blocking if
/// another instance already holds it.
async fn try_leader_lock(state: &AppState, key: i64) -> AppResult<bool> {
    let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(&state.main_pool)
        .await?;
    Ok(acquired)
}

async fn release_leader_lock(state: &AppState, key: i64) {
    if let Err(err) = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(key)
        .execute(&state.main_pool)
        .await
    {
        tracing::error!(error = %err, key, "failed to release advisory lock");
    }
}

/// Run `body` for every active tenant, holding `key`'s leader lock for the duration.
/// Per-tenant failures and deadline overruns are logged and do not abort the sweep.
async fn run_for_every_tenant<F, Fut>(state: &AppState, job_name: &str, key: i64, body: F)
where
    F: Fn(AppState, uuid::Uuid) -> Fut,
    Fut: std::future::Future<Output = AppResult<()>>,
{
    match try_leader_lock(state, key).await {
        Ok(false) => {
            tracing::debug!(job = job_name, "another instance holds the leader lock, skipping");
            return;
        }
        Err(err) => {
            tracing::error!(job = job_name, error = %err, "failed to acquire leader lock");
            return;
        }
        Ok(true) => {}
    }

    let tenants = match state.registry.list_active().await {
        Ok(tenants) => tenants,
        Err(err) => {
            tracing::error!(job = job_name, error = %err, "failed to list active tenants");
            release_leader_lock(state, key).await;
            return;
        }
    };

    for gym_id in tenants {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(PER_TENANT_SOFT_DEADLINE, body(state.clone(), gym_id)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(job = job_name, gym_id = %gym_id, error = %err, "job failed for tenant, continuing");
            }
            Err(_) => {
                tracing::warn!(job = job_name, gym_id = %gym_id, elapsed_ms = started.elapsed().as_millis() as u64, "tenant exceeded soft deadline, moving on");
            }
        }
    }

    release_leader_lock(state, key).await;
}

/// Build and start the scheduler with every standard recurring job registered.
///
/// # Errors
/// Propagates errors from `tokio-cron-scheduler` job construction or scheduler start.
pub async fn start(state: AppState) -> AppResult<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| crate::errors::AppError::internal(format!("failed to build scheduler: {e}")))?;

    let state = Arc::new(state);

    register(&scheduler, "0 0 1 * *", "recurring_salaries", lock_keys::RECURRING_SALARIES, &state, jobs::recurring_salaries).await?;
    register(&scheduler, "0 0 * * *", "loyalty_expiry", lock_keys::LOYALTY_EXPIRY, &state, jobs::loyalty_expiry).await?;
    register(&scheduler, "0 15 0 * *", "tier_recomputation", lock_keys::TIER_RECOMPUTE, &state, jobs::tier_recomputation).await?;
    register(&scheduler, "0 30 0 * *", "engagement_refresh", lock_keys::ENGAGEMENT_REFRESH, &state, jobs::engagement_refresh).await?;
    register(&scheduler, "0 0 * * * *", "membership_expiry_sweep", lock_keys::MEMBERSHIP_EXPIRY_SWEEP, &state, jobs::membership_expiry_sweep).await?;
    register(&scheduler, "0 15 * * * *", "membership_expiry_notices", lock_keys::MEMBERSHIP_EXPIRY_NOTICES, &state, jobs::membership_expiry_notices).await?;

    scheduler
        .start()
        .await
        .map_err(|e| crate::errors::AppError::internal(format!("failed to start scheduler: {e}")))?;
    Ok(scheduler)
}

type JobBody = fn(AppState, uuid::Uuid) -> std::pin::Pin<Box<dyn std::future::Future<Output = AppResult<()>> + Send>>;

async fn register(
    scheduler: &JobScheduler,
    cron_expr: &str,
    job_name: &'static str,
    key: i64,
    state: &Arc<AppState>,
    body: JobBody,
) -> AppResult<()> {
    let state = Arc::clone(state);
    let job = Job::new_async(cron_expr, move |_uuid, _lock| {
        let state = (*state).clone();
        Box::pin(async move {
            tracing::debug!(job = job_name, "scheduled job starting");
            run_for_every_tenant(&state, job_name, key, body).await;
            tracing::debug!(job = job_name, "scheduled job finished");
        })
    })
    .map_err(|e| crate::errors::AppError::internal(format!("invalid cron expression for {job_name}: {e}")))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| crate::errors::AppError::internal(format!("failed to register job {job_name}: {e}")))?;
    Ok(())
}
