// ABOUTME: End-to-end scenarios against a real Postgres schema, skipped when TEST_DATABASE_URL is unset
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod common;

use chrono::{Duration, NaiveDate, Utc};
use gymflow_server::pipelines::membership;
use gymflow_server::scheduler::jobs;
use rust_decimal::Decimal;
use serial_test::serial;
use uuid::Uuid;

/// E1: registering a tenant provisions its schema, migrates it, and seeds the baseline
/// catalog rows (3 plans, 4 loyalty tiers, 6 achievements, 8 currencies).
#[tokio::test]
#[serial]
async fn scenario_e1_tenant_registration_seeds_baseline_catalog() {
    let Some(fixture) = common::provision().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let schema = gymflow_server::tenant::TenantRegistry::schema_name(fixture.gym_id);
    let main_pool = fixture.state.main_pool.clone();

    let (plan_count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{schema}\".plans"))
        .fetch_one(&main_pool)
        .await
        .expect("count plans");
    assert_eq!(plan_count, 3);

    let (tier_count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{schema}\".loyalty_tiers"))
        .fetch_one(&main_pool)
        .await
        .expect("count tiers");
    assert_eq!(tier_count, 4);

    let (achievement_count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{schema}\".achievements"))
        .fetch_one(&main_pool)
        .await
        .expect("count achievements");
    assert!(achievement_count >= 6);

    let (currency_count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{schema}\".currencies"))
        .fetch_one(&main_pool)
        .await
        .expect("count currencies");
    assert_eq!(currency_count, 8);

    let (log_count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{schema}\".migration_log"))
        .fetch_one(&main_pool)
        .await
        .expect("count migration log rows");
    assert!(log_count > 0, "migration log should record every applied step");
}

/// E5: a membership is paid, activates, and the hourly expiry sweep flips it to
/// `expired` once `end_date` is in the past.
#[tokio::test]
#[serial]
async fn scenario_e5_membership_payment_then_expiry_sweep() {
    let Some(fixture) = common::provision().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let mut conn = fixture
        .state
        .broker
        .tenant_pool()
        .acquire()
        .await
        .expect("acquire tenant connection");
    let schema = gymflow_server::tenant::TenantRegistry::schema_name(fixture.gym_id);
    sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
        .execute(&mut *conn)
        .await
        .expect("pin search_path");

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, role) VALUES ($1, 'member')")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .expect("seed member");
    let (plan_id,): (Uuid,) = sqlx::query_as("SELECT id FROM plans WHERE name = 'monthly'")
        .fetch_one(&mut *conn)
        .await
        .expect("fetch monthly plan");

    let membership_id = Uuid::new_v4();
    let start_date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let end_date = NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date");
    sqlx::query(
        "INSERT INTO memberships (id, user_id, plan_id, status, start_date, end_date, original_amount, discount_amount, final_amount)
         VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8)",
    )
    .bind(membership_id)
    .bind(user_id)
    .bind(plan_id)
    .bind(start_date)
    .bind(end_date)
    .bind(Decimal::new(1000, 0))
    .bind(Decimal::new(100, 0))
    .bind(Decimal::new(900, 0))
    .execute(&mut *conn)
    .await
    .expect("seed pending membership");

    membership::record_payment(&mut conn, membership_id, Decimal::new(900, 0), Decimal::ZERO, Decimal::ZERO, Some("R-1"))
        .await
        .expect("record payment");
    membership::activate_after_payment(&mut conn, &fixture.state.notifications, fixture.gym_id, membership_id, user_id, "monthly")
        .await
        .expect("activate membership");

    let (status, net_amount): (String, Decimal) =
        sqlx::query_as("SELECT m.status, p.net_amount FROM memberships m JOIN payments p ON p.membership_id = m.id WHERE m.id = $1")
            .bind(membership_id)
            .fetch_one(&mut *conn)
            .await
            .expect("fetch status and payment");
    assert_eq!(status, "active");
    assert_eq!(net_amount, Decimal::new(900, 0));

    let sweep_date = NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date");
    membership::expire_past_due(&mut conn, sweep_date).await.expect("run expiry sweep");

    let (status,): (String,) = sqlx::query_as("SELECT status FROM memberships WHERE id = $1")
        .bind(membership_id)
        .fetch_one(&mut *conn)
        .await
        .expect("fetch status after sweep");
    assert_eq!(status, "expired");
}

/// E6: the recurring-salary job creates next month's pending salary once, and running
/// it a second time inserts nothing.
#[tokio::test]
#[serial]
async fn scenario_e6_recurring_salary_job_is_idempotent() {
    let Some(fixture) = common::provision().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    // Seed "last month"'s recurring salary dynamically so the test is deterministic
    // regardless of which month it actually runs in.
    let last_month_anchor = Utc::now() - Duration::days(28);
    let last_month = last_month_anchor.format("%m").to_string().parse::<i32>().expect("month");
    let last_year = last_month_anchor.format("%Y").to_string().parse::<i32>().expect("year");

    let staff_id = Uuid::new_v4();
    {
        let mut conn = fixture.state.broker.tenant_pool().acquire().await.expect("acquire tenant connection");
        let schema = gymflow_server::tenant::TenantRegistry::schema_name(fixture.gym_id);
        sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
            .execute(&mut *conn)
            .await
            .expect("pin search_path");

        sqlx::query("INSERT INTO users (id, role, is_active) VALUES ($1, 'staff', true)")
            .bind(staff_id)
            .execute(&mut *conn)
            .await
            .expect("seed staff");
        sqlx::query(
            "INSERT INTO staff_salaries (id, staff_id, month, year, net_amount, is_recurring, status)
             VALUES ($1, $2, $3, $4, 20000, true, 'paid')",
        )
        .bind(Uuid::new_v4())
        .bind(staff_id)
        .bind(last_month)
        .bind(last_year)
        .execute(&mut *conn)
        .await
        .expect("seed last month's salary");
    }

    jobs::recurring_salaries(fixture.state.clone(), fixture.gym_id).await.expect("run recurring salary job");
    jobs::recurring_salaries(fixture.state.clone(), fixture.gym_id).await.expect("run recurring salary job again");

    let mut conn = fixture.state.broker.tenant_pool().acquire().await.expect("acquire tenant connection");
    let schema = gymflow_server::tenant::TenantRegistry::schema_name(fixture.gym_id);
    sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
        .execute(&mut *conn)
        .await
        .expect("pin search_path");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM staff_salaries WHERE staff_id = $1 AND status = 'pending'")
        .bind(staff_id)
        .fetch_one(&mut *conn)
        .await
        .expect("count generated salaries");

    assert_eq!(count, 1, "recurring salary job must create exactly one pending row, and running it twice must not duplicate it");
}
