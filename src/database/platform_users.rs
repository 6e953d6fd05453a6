// ABOUTME: Typed access to the main-schema platform_users table (super admins and gym owners)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::errors::{AppError, AppResult};
use crate::tenant::Role;

/// A row in `platform_users`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlatformUser {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email, unique.
    pub email: String,
    #[serde(skip)]
    password_hash: String,
    /// `super_admin` or `gym_owner`.
    pub role: String,
    /// The gym this user owns, if role is `gym_owner`.
    pub gym_id: Option<Uuid>,
    /// Branch scope, rarely set for platform users.
    pub branch_id: Option<Uuid>,
    /// Platform-level super admin flag.
    pub is_super_admin: bool,
    /// Whether the account is active.
    pub is_active: bool,
}

/// Typed access to the `platform_users` table.
#[derive(Clone)]
pub struct PlatformUserRepository {
    pool: PgPool,
}

impl PlatformUserRepository {
    /// Build a repository over the main pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a gym owner account, hashing the supplied plaintext password.
    ///
    /// # Errors
    /// Propagates hashing or database errors, including a unique-email conflict.
    pub async fn create_gym_owner(&self, name: &str, email: &str, password: &str, gym_id: Uuid) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let password_hash = auth::hash_password(password)?;
        sqlx::query(
            "INSERT INTO platform_users (id, name, email, password_hash, role, gym_id, is_super_admin)
             VALUES ($1, $2, $3, $4, 'gym_owner', $5, false)",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(gym_id)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Verify credentials and return the matched user, if any.
    ///
    /// # Errors
    /// Returns [`AppError::unauthorized`] on unknown email, wrong password, or inactive
    /// account. Propagates other database errors.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<PlatformUser> {
        let user: Option<PlatformUser> = sqlx::query_as(
            "SELECT id, name, email, password_hash, role, gym_id, branch_id, is_super_admin, is_active
             FROM platform_users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        let user = user.ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
        if !user.is_active {
            return Err(AppError::unauthorized("account is inactive"));
        }
        auth::verify_password(password, &user.password_hash)?;
        Ok(user)
    }

    /// The [`Role`] this platform user resolves to, for JWT issuance.
    #[must_use]
    pub fn role(user: &PlatformUser) -> Option<Role> {
        Role::parse(&user.role)
    }
}
