// ABOUTME: Versioned steps for the public schema: tenants, platform users, plans, support
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::MigrationStep;

/// The ordered list of main-schema migration steps.
#[must_use]
pub fn steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep {
            ordinal: 1,
            name: "create_tenants",
            sql: "CREATE TABLE IF NOT EXISTS tenants (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id UUID,
                tenant_schema_name TEXT NOT NULL UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 2,
            name: "create_active_tenant_schemas",
            sql: "CREATE TABLE IF NOT EXISTS active_tenant_schemas (
                gym_id UUID PRIMARY KEY,
                schema_name TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 3,
            name: "create_platform_users",
            sql: "CREATE TABLE IF NOT EXISTS platform_users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('super_admin', 'gym_owner')),
                gym_id UUID REFERENCES tenants (id),
                branch_id UUID,
                is_super_admin BOOLEAN NOT NULL DEFAULT false,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 4,
            name: "create_subscription_plans",
            sql: "CREATE TABLE IF NOT EXISTS subscription_plans (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                features JSONB NOT NULL DEFAULT '[]'::jsonb
            )",
        },
        MigrationStep {
            ordinal: 5,
            name: "create_tenant_subscriptions",
            sql: "CREATE TABLE IF NOT EXISTS tenant_subscriptions (
                tenant_id UUID PRIMARY KEY REFERENCES tenants (id),
                plan_id UUID NOT NULL REFERENCES subscription_plans (id),
                is_active BOOLEAN NOT NULL DEFAULT true,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 6,
            name: "create_system_notifications",
            sql: "CREATE TABLE IF NOT EXISTS system_notifications (
                id UUID PRIMARY KEY,
                gym_id UUID REFERENCES tenants (id),
                notification_type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT false,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 7,
            name: "create_support_tickets",
            sql: "CREATE TABLE IF NOT EXISTS support_tickets (
                id UUID PRIMARY KEY,
                gym_id UUID REFERENCES tenants (id),
                subject TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 8,
            name: "create_support_messages",
            sql: "CREATE TABLE IF NOT EXISTS support_messages (
                id UUID PRIMARY KEY,
                ticket_id UUID NOT NULL REFERENCES support_tickets (id),
                author_id UUID,
                body TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 9,
            name: "create_contact_requests",
            sql: "CREATE TABLE IF NOT EXISTS contact_requests (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationStep {
            ordinal: 10,
            name: "seed_subscription_plans",
            sql: "INSERT INTO subscription_plans (id, name, features)
                SELECT '00000000-0000-0000-0000-000000000001'::uuid, 'starter', '[\"attendance\"]'::jsonb
                WHERE NOT EXISTS (SELECT 1 FROM subscription_plans WHERE name = 'starter')",
        },
    ]
}
