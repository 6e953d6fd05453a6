// ABOUTME: Typed access to main-schema entities: tenants, platform users, subscriptions, support
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod platform_users;
mod subscriptions;
mod support;
mod tenants;

pub use platform_users::{PlatformUser, PlatformUserRepository};
pub use subscriptions::{SubscriptionPlan, SubscriptionRepository};
pub use support::{SupportRepository, SupportTicket};
pub use tenants::{Tenant, TenantRepository};
