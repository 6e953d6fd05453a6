// ABOUTME: Versioned steps applied to every tenant schema: members, memberships, engagement data
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::MigrationStep;

/// The ordered list of tenant-schema migration steps. Applied once per tenant schema,
/// tracked independently per schema in that schema's `migration_log`.
#[must_use]
pub fn steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep {
            ordinal: 1,
            name: "create_branches",
            sql: "CREATE TABLE IF NOT EXISTS branches (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 2,
            name: "create_users",
            sql: "CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT,
                role TEXT NOT NULL CHECK (role IN ('branch_manager', 'staff', 'member')),
                branch_id UUID REFERENCES branches (id),
                is_active BOOLEAN NOT NULL DEFAULT true,
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                deleted_at TIMESTAMPTZ,
                deleted_by UUID,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 3,
            name: "create_users_email_unique_active",
            sql: "CREATE UNIQUE INDEX IF NOT EXISTS users_email_unique_active
                ON users (email) WHERE is_deleted = false",
        },
        MigrationStep {
            ordinal: 4,
            name: "create_plans",
            sql: "CREATE TABLE IF NOT EXISTS plans (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                price NUMERIC(12, 2) NOT NULL,
                duration_days INTEGER NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 5,
            name: "create_currencies",
            sql: "CREATE TABLE IF NOT EXISTS currencies (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL
            )",
        },
        MigrationStep {
            ordinal: 6,
            name: "create_memberships",
            sql: "CREATE TABLE IF NOT EXISTS memberships (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users (id),
                plan_id UUID NOT NULL REFERENCES plans (id),
                branch_id UUID REFERENCES branches (id),
                status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'expired', 'cancelled', 'suspended')),
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                original_amount NUMERIC(12, 2) NOT NULL,
                discount_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
                final_amount NUMERIC(12, 2) NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CHECK (end_date >= start_date)
            )",
        },
        MigrationStep {
            ordinal: 7,
            name: "create_memberships_one_active_per_user",
            sql: "CREATE UNIQUE INDEX IF NOT EXISTS memberships_one_active_per_user
                ON memberships (user_id) WHERE status = 'active' AND is_deleted = false",
        },
        MigrationStep {
            ordinal: 8,
            name: "create_membership_history",
            sql: "CREATE TABLE IF NOT EXISTS membership_history (
                id UUID PRIMARY KEY,
                membership_id UUID NOT NULL REFERENCES memberships (id),
                archive_reason TEXT NOT NULL,
                cancellation_reason_code TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 9,
            name: "create_payments",
            sql: "CREATE TABLE IF NOT EXISTS payments (
                id UUID PRIMARY KEY,
                membership_id UUID REFERENCES memberships (id),
                salary_id UUID,
                amount NUMERIC(12, 2) NOT NULL,
                tax_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
                discount_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
                net_amount NUMERIC(12, 2) NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'processing', 'completed', 'failed', 'cancelled', 'refunded')),
                payment_ref TEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CHECK (amount + tax_amount - discount_amount = net_amount)
            )",
        },
        MigrationStep {
            ordinal: 10,
            name: "create_staff_salaries",
            sql: "CREATE TABLE IF NOT EXISTS staff_salaries (
                id UUID PRIMARY KEY,
                staff_id UUID NOT NULL REFERENCES users (id),
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                year INTEGER NOT NULL,
                net_amount NUMERIC(12, 2) NOT NULL,
                is_recurring BOOLEAN NOT NULL DEFAULT false,
                status TEXT NOT NULL DEFAULT 'pending',
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 11,
            name: "create_staff_salaries_one_per_period",
            sql: "CREATE UNIQUE INDEX IF NOT EXISTS staff_salaries_one_per_period
                ON staff_salaries (staff_id, month, year) WHERE is_deleted = false",
        },
        MigrationStep {
            ordinal: 12,
            name: "create_attendance",
            sql: "CREATE TABLE IF NOT EXISTS attendance (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users (id),
                branch_id UUID REFERENCES branches (id),
                checked_in_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                is_deleted BOOLEAN NOT NULL DEFAULT false
            )",
        },
        MigrationStep {
            ordinal: 13,
            name: "create_streaks",
            sql: "CREATE TABLE IF NOT EXISTS streaks (
                user_id UUID NOT NULL REFERENCES users (id),
                streak_type TEXT NOT NULL,
                current_count INTEGER NOT NULL DEFAULT 0,
                longest_count INTEGER NOT NULL DEFAULT 0,
                last_event_date DATE,
                PRIMARY KEY (user_id, streak_type)
            )",
        },
        MigrationStep {
            ordinal: 14,
            name: "create_challenges",
            sql: "CREATE TABLE IF NOT EXISTS challenges (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                metric TEXT NOT NULL,
                goal NUMERIC(12, 2) NOT NULL,
                status TEXT NOT NULL DEFAULT 'upcoming',
                is_deleted BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 15,
            name: "create_challenge_participants",
            sql: "CREATE TABLE IF NOT EXISTS challenge_participants (
                challenge_id UUID NOT NULL REFERENCES challenges (id),
                user_id UUID NOT NULL REFERENCES users (id),
                current_value NUMERIC(12, 2) NOT NULL DEFAULT 0,
                progress_pct NUMERIC(5, 2) NOT NULL DEFAULT 0,
                PRIMARY KEY (challenge_id, user_id)
            )",
        },
        MigrationStep {
            ordinal: 16,
            name: "create_achievements",
            sql: "CREATE TABLE IF NOT EXISTS achievements (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                criteria JSONB NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT false
            )",
        },
        MigrationStep {
            ordinal: 17,
            name: "create_user_achievements",
            sql: "CREATE TABLE IF NOT EXISTS user_achievements (
                user_id UUID NOT NULL REFERENCES users (id),
                achievement_id UUID NOT NULL REFERENCES achievements (id),
                earned_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (user_id, achievement_id)
            )",
        },
        MigrationStep {
            ordinal: 18,
            name: "create_loyalty_config",
            sql: "CREATE TABLE IF NOT EXISTS loyalty_config (
                id INTEGER PRIMARY KEY DEFAULT 1,
                enabled BOOLEAN NOT NULL DEFAULT true,
                point_expiry_days INTEGER NOT NULL DEFAULT 365,
                base_points_visit NUMERIC(12, 4) NOT NULL DEFAULT 10,
                base_points_purchase_unit NUMERIC(12, 4) NOT NULL DEFAULT 1,
                CHECK (id = 1)
            )",
        },
        MigrationStep {
            ordinal: 19,
            name: "create_loyalty_tiers",
            sql: "CREATE TABLE IF NOT EXISTS loyalty_tiers (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                min_points NUMERIC(12, 2) NOT NULL,
                multiplier NUMERIC(6, 4) NOT NULL
            )",
        },
        MigrationStep {
            ordinal: 20,
            name: "create_loyalty_points",
            sql: "CREATE TABLE IF NOT EXISTS loyalty_points (
                user_id UUID PRIMARY KEY REFERENCES users (id),
                total_earned NUMERIC(14, 2) NOT NULL DEFAULT 0,
                total_redeemed NUMERIC(14, 2) NOT NULL DEFAULT 0,
                total_expired NUMERIC(14, 2) NOT NULL DEFAULT 0,
                current_balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
                tier_id UUID REFERENCES loyalty_tiers (id),
                tier_updated_at TIMESTAMPTZ,
                CHECK (current_balance >= 0)
            )",
        },
        MigrationStep {
            ordinal: 21,
            name: "create_loyalty_transactions",
            sql: "CREATE TABLE IF NOT EXISTS loyalty_transactions (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users (id),
                transaction_type TEXT NOT NULL CHECK (transaction_type IN ('earn', 'redeem', 'expire')),
                points NUMERIC(12, 2) NOT NULL,
                balance_after NUMERIC(14, 2) NOT NULL,
                source TEXT NOT NULL,
                reference TEXT,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 22,
            name: "create_engagement_scores",
            sql: "CREATE TABLE IF NOT EXISTS engagement_scores (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users (id),
                visit_frequency NUMERIC(5, 2) NOT NULL,
                visit_recency NUMERIC(5, 2) NOT NULL,
                attendance_trend NUMERIC(5, 2) NOT NULL,
                payment_reliability NUMERIC(5, 2) NOT NULL,
                membership_tenure NUMERIC(5, 2) NOT NULL,
                engagement_depth NUMERIC(5, 2) NOT NULL,
                overall_score NUMERIC(5, 2) NOT NULL,
                risk_level TEXT NOT NULL CHECK (risk_level IN ('low', 'medium', 'high', 'critical')),
                is_current BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 23,
            name: "create_engagement_scores_one_current",
            sql: "CREATE UNIQUE INDEX IF NOT EXISTS engagement_scores_one_current
                ON engagement_scores (user_id) WHERE is_current = true",
        },
        MigrationStep {
            ordinal: 24,
            name: "create_churn_alerts",
            sql: "CREATE TABLE IF NOT EXISTS churn_alerts (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users (id),
                previous_risk_level TEXT NOT NULL,
                new_risk_level TEXT NOT NULL,
                factors JSONB NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 25,
            name: "create_notifications",
            sql: "CREATE TABLE IF NOT EXISTS notifications (
                id UUID PRIMARY KEY,
                user_id UUID REFERENCES users (id),
                notification_type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'normal',
                is_read BOOLEAN NOT NULL DEFAULT false,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 26,
            name: "create_cancellation_reasons",
            sql: "CREATE TABLE IF NOT EXISTS cancellation_reasons (
                code TEXT PRIMARY KEY,
                label TEXT NOT NULL
            )",
        },
        MigrationStep {
            ordinal: 27,
            name: "seed_plans",
            sql: "INSERT INTO plans (id, name, price, duration_days)
                SELECT * FROM (VALUES
                    ('10000000-0000-0000-0000-000000000001'::uuid, 'monthly', 999.00, 30),
                    ('10000000-0000-0000-0000-000000000002'::uuid, 'quarterly', 2499.00, 90),
                    ('10000000-0000-0000-0000-000000000003'::uuid, 'annual', 7999.00, 365)
                ) AS seed (id, name, price, duration_days)
                WHERE NOT EXISTS (SELECT 1 FROM plans WHERE plans.name = seed.name)",
        },
        MigrationStep {
            ordinal: 28,
            name: "seed_loyalty_config",
            sql: "INSERT INTO loyalty_config (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
        },
        MigrationStep {
            ordinal: 29,
            name: "seed_loyalty_tiers",
            sql: "INSERT INTO loyalty_tiers (id, name, min_points, multiplier)
                SELECT * FROM (VALUES
                    ('20000000-0000-0000-0000-000000000001'::uuid, 'Bronze', 0.00, 1.00),
                    ('20000000-0000-0000-0000-000000000002'::uuid, 'Silver', 500.00, 1.25),
                    ('20000000-0000-0000-0000-000000000003'::uuid, 'Gold', 2000.00, 1.50),
                    ('20000000-0000-0000-0000-000000000004'::uuid, 'Platinum', 5000.00, 2.00)
                ) AS seed (id, name, min_points, multiplier)
                WHERE NOT EXISTS (SELECT 1 FROM loyalty_tiers WHERE loyalty_tiers.name = seed.name)",
        },
        MigrationStep {
            ordinal: 30,
            name: "seed_achievements",
            sql: "INSERT INTO achievements (id, name, criteria)
                SELECT * FROM (VALUES
                    ('30000000-0000-0000-0000-000000000001'::uuid, 'First Visit', '{\"type\":\"total_visits\",\"value\":1}'::jsonb),
                    ('30000000-0000-0000-0000-000000000002'::uuid, '10 Visits', '{\"type\":\"total_visits\",\"value\":10}'::jsonb),
                    ('30000000-0000-0000-0000-000000000003'::uuid, '50 Visits', '{\"type\":\"total_visits\",\"value\":50}'::jsonb),
                    ('30000000-0000-0000-0000-000000000004'::uuid, '7 Day Streak', '{\"type\":\"streak_days\",\"value\":7}'::jsonb),
                    ('30000000-0000-0000-0000-000000000005'::uuid, '30 Day Streak', '{\"type\":\"streak_days\",\"value\":30}'::jsonb),
                    ('30000000-0000-0000-0000-000000000006'::uuid, '100 Day Streak', '{\"type\":\"streak_days\",\"value\":100}'::jsonb)
                ) AS seed (id, name, criteria)
                WHERE NOT EXISTS (SELECT 1 FROM achievements WHERE achievements.name = seed.name)",
        },
        MigrationStep {
            ordinal: 31,
            name: "seed_currencies",
            sql: "INSERT INTO currencies (code, name, symbol)
                SELECT * FROM (VALUES
                    ('USD', 'US Dollar', '$'), ('EUR', 'Euro', '€'), ('GBP', 'Pound Sterling', '£'),
                    ('INR', 'Indian Rupee', '₹'), ('AUD', 'Australian Dollar', '$'),
                    ('CAD', 'Canadian Dollar', '$'), ('JPY', 'Japanese Yen', '¥'), ('CNY', 'Chinese Yuan', '¥')
                ) AS seed (code, name, symbol)
                WHERE NOT EXISTS (SELECT 1 FROM currencies WHERE currencies.code = seed.code)",
        },
        MigrationStep {
            ordinal: 32,
            name: "seed_cancellation_reasons",
            sql: "INSERT INTO cancellation_reasons (code, label)
                SELECT * FROM (VALUES
                    ('relocation', 'Relocation'), ('cost', 'Cost'), ('dissatisfaction', 'Dissatisfaction'), ('other', 'Other')
                ) AS seed (code, label)
                WHERE NOT EXISTS (SELECT 1 FROM cancellation_reasons WHERE cancellation_reasons.code = seed.code)",
        },
    ]
}
