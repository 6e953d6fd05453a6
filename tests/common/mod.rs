// ABOUTME: Shared fixture for tests that need a real Postgres schema: provision, hand back, drop
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use gymflow_server::config::{LogFormat, LoggingConfig, NetworkConfig, PoolConfig};
use gymflow_server::context::AppState;
use gymflow_server::notifications::{BroadcastGateway, NotificationHub};
use gymflow_server::tenant::{TenantBroker, TenantRegistry};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use zeroize::Zeroizing;

/// A throwaway tenant schema plus the `AppState` needed to exercise pipelines and
/// scheduler jobs against it. Dropped on `Drop` so a failing test never leaves a
/// `tenant_*` schema behind in the shared test database.
pub struct TenantFixture {
    pub state: AppState,
    pub gym_id: Uuid,
    main_pool: PgPool,
}

impl Drop for TenantFixture {
    fn drop(&mut self) {
        let schema = TenantRegistry::schema_name(self.gym_id);
        let pool = self.main_pool.clone();
        // best-effort: a leaked schema from a panicking test is a nuisance, not a failure
        let _ = tokio::task::spawn_blocking(move || {
            tokio::runtime::Handle::current()
                .block_on(async move { sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{schema}\" CASCADE")).execute(&pool).await })
        });
    }
}

/// Returns `None` (instead of failing) when `TEST_DATABASE_URL` is unset, so the suite
/// stays green on a machine with no Postgres reachable.
pub async fn provision() -> Option<TenantFixture> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let main_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    gymflow_server::migrations::run(&main_pool, gymflow_server::migrations::MigrationFamily::Main)
        .await
        .expect("apply main-schema migrations");

    let registry = TenantRegistry::new(main_pool.clone());
    let gym_id = Uuid::new_v4();
    registry.create(gym_id).await.expect("provision tenant schema");

    let broker = TenantBroker::new(main_pool.clone(), main_pool.clone());
    let notifications = NotificationHub::new(main_pool.clone(), BroadcastGateway::new());
    let config = gymflow_server::config::AppConfig {
        environment: test_environment(&database_url),
        pools: PoolConfig::default(),
        network: NetworkConfig {
            bind_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            allowed_origin: "http://localhost".to_owned(),
        },
        logging: LoggingConfig {
            format: LogFormat::Pretty,
            filter: "gymflow_server=debug".to_owned(),
        },
    };

    let state = AppState {
        main_pool: main_pool.clone(),
        broker,
        registry,
        tokens: gymflow_server::auth::TokenService::new("test-only-secret-at-least-32-bytes-long"),
        notifications,
        config,
    };

    Some(TenantFixture { state, gym_id, main_pool })
}

fn test_environment(database_url: &str) -> gymflow_server::config::EnvironmentConfig {
    gymflow_server::config::EnvironmentConfig {
        database_url: database_url.to_owned(),
        direct_url: database_url.to_owned(),
        port: 0,
        frontend_url: "http://localhost".to_owned(),
        jwt_secret: Zeroizing::new("test-only-secret-at-least-32-bytes-long".to_owned()),
    }
}
