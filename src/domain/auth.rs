// ABOUTME: Gym registration and login handlers, the only routes reachable without a bearer token
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::AppState;
use crate::database::{PlatformUserRepository, TenantRepository};
use crate::errors::AppResult;
use crate::tenant::{Principal, Role};

/// Body for registering a new gym and its owner account in one call.
#[derive(Debug, Deserialize)]
pub struct RegisterGymRequest {
    /// Display name of the gym.
    pub gym_name: String,
    /// Owner's display name.
    pub owner_name: String,
    /// Owner's login email.
    pub owner_email: String,
    /// Owner's plaintext password, hashed before storage.
    pub owner_password: String,
}

/// Response for both registration and login: the issued bearer token plus the principal.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token to send as `Authorization: Bearer <token>` on subsequent calls.
    pub token: String,
    /// The resolved gym id.
    pub gym_id: Uuid,
    /// The resolved user id.
    pub user_id: Uuid,
}

/// `POST /api/auth/register-gym`: create a gym owner, provision the tenant schema, and
/// issue a token for the new owner.
///
/// # Errors
/// Returns [`AppError::conflict`] if the owner email is already taken, or propagates
/// schema-provisioning errors.
pub async fn register_gym(
    State(state): State<AppState>,
    Json(body): Json<RegisterGymRequest>,
) -> AppResult<Json<AuthResponse>> {
    let users = PlatformUserRepository::new(state.main_pool.clone());
    let tenants = TenantRepository::new(state.main_pool.clone());

    // The owner row references its gym, but the gym row also references its owner, so
    // the tenant is registered under a throwaway owner id and repointed afterward.
    let placeholder_owner = Uuid::new_v4();
    let tenant = tenants.register(&state.registry, &body.gym_name, placeholder_owner).await?;

    let owner_id = users
        .create_gym_owner(&body.owner_name, &body.owner_email, &body.owner_password, tenant.id)
        .await?;

    let principal = Principal {
        user_id: owner_id,
        role: Role::GymOwner,
        gym_id: Some(tenant.id),
        branch_id: None,
        is_super_admin: false,
    };
    let token = state.tokens.issue(&principal)?;

    Ok(Json(AuthResponse {
        token,
        gym_id: tenant.id,
        user_id: owner_id,
    }))
}

/// Body for logging in as a platform user (super admin or gym owner).
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// `POST /api/auth/login`.
///
/// # Errors
/// Returns [`AppError::unauthorized`] on bad credentials or an inactive account.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> AppResult<Json<AuthResponse>> {
    let users = PlatformUserRepository::new(state.main_pool.clone());
    let user = users.authenticate(&body.email, &body.password).await?;
    let role = PlatformUserRepository::role(&user).unwrap_or(Role::GymOwner);

    let principal = Principal {
        user_id: user.id,
        role,
        gym_id: user.gym_id,
        branch_id: user.branch_id,
        is_super_admin: user.is_super_admin,
    };
    let token = state.tokens.issue(&principal)?;

    Ok(Json(AuthResponse {
        token,
        gym_id: user.gym_id.unwrap_or_default(),
        user_id: user.id,
    }))
}
