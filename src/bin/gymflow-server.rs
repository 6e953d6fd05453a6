// ABOUTME: Process entry point: load config, provision pools, reconcile tenants, serve
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;

use gymflow_server::auth::TokenService;
use gymflow_server::config::AppConfig;
use gymflow_server::context::AppState;
use gymflow_server::migrations::{self, MigrationFamily};
use gymflow_server::notifications::{BroadcastGateway, NotificationHub};
use gymflow_server::tenant::{TenantBroker, TenantRegistry};
use gymflow_server::{logging, routes, scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    logging::init(&config.logging).context("initializing logging")?;

    let main_pool = PgPoolOptions::new()
        .max_connections(config.pools.main_max_connections)
        .acquire_timeout(config.pools.acquire_timeout)
        .connect(&config.environment.database_url)
        .await
        .context("connecting main pool")?;

    let tenant_pool = PgPoolOptions::new()
        .max_connections(config.pools.tenant_max_connections)
        .acquire_timeout(config.pools.acquire_timeout)
        .connect(&config.environment.database_url)
        .await
        .context("connecting tenant pool")?;

    migrations::run(&main_pool, MigrationFamily::Main)
        .await
        .context("applying main-schema migrations")?;

    let registry = TenantRegistry::new(main_pool.clone());
    reconcile_tenants(&main_pool, &registry).await?;

    let broker = TenantBroker::new(main_pool.clone(), tenant_pool);
    let tokens = TokenService::new(&config.environment.jwt_secret);
    let notifications = NotificationHub::new(main_pool.clone(), BroadcastGateway::new());

    let state = AppState {
        main_pool,
        broker,
        registry,
        tokens,
        notifications,
        config: config.clone(),
    };

    let job_scheduler = scheduler::start(state.clone())
        .await
        .context("starting job scheduler")?;

    let app = routes::build(state);
    let listener = tokio::net::TcpListener::bind(config.network.bind_addr)
        .await
        .context("binding listener")?;
    tracing::info!(addr = %config.network.bind_addr, "gymflow-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    job_scheduler
        .shutdown()
        .await
        .map_err(|e| anyhow::anyhow!("scheduler shutdown failed: {e}"))?;
    Ok(())
}

/// Ensure every gym registered in `public.tenants` has a provisioned, migrated schema.
/// Runs once at startup so a crash between registering a tenant and provisioning its
/// schema is healed on the next boot rather than left as a silent gap.
async fn reconcile_tenants(main_pool: &sqlx::PgPool, registry: &TenantRegistry) -> Result<()> {
    let gym_ids: Vec<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM tenants WHERE is_active = true")
        .fetch_all(main_pool)
        .await
        .context("listing tenants to reconcile")?;

    for (gym_id,) in gym_ids {
        registry
            .create(gym_id)
            .await
            .with_context(|| format!("reconciling tenant schema for gym {gym_id}"))?;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
    tokio::time::sleep(Duration::from_millis(100)).await;
}
