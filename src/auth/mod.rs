// ABOUTME: Bearer JWT issuance/verification, password hashing, and the four-guard capability chain
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod guards;

pub use guards::{require_features, require_role, GymScope};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::tenant::{Principal, Role};

/// JWT claims carried by every bearer token this service issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the platform or tenant user id.
    pub sub: Uuid,
    /// Role string, parsed via [`Role::parse`].
    pub role: String,
    /// Gym the principal belongs to, if any.
    pub gym_id: Option<Uuid>,
    /// Branch the principal is scoped to, if any.
    pub branch_id: Option<Uuid>,
    /// Whether this principal is a platform super admin.
    pub is_super_admin: bool,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Default token lifetime.
pub const TOKEN_TTL: Duration = Duration::hours(12);

/// Issues and verifies bearer tokens signed with one HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Build a token service from the configured JWT secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token for `principal`, valid for [`TOKEN_TTL`].
    ///
    /// # Errors
    /// Returns an error if token encoding fails.
    pub fn issue(&self, principal: &Principal) -> AppResult<String> {
        let claims = Claims {
            sub: principal.user_id,
            role: principal.role.as_str().to_owned(),
            gym_id: principal.gym_id,
            branch_id: principal.branch_id,
            is_super_admin: principal.is_super_admin,
            exp: (Utc::now() + TOKEN_TTL).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::from)
    }

    /// Verify a bearer token and recover the [`Principal`] it encodes.
    ///
    /// # Errors
    /// Returns [`AppError::unauthorized`] if the token is expired, malformed, has a bad
    /// signature, or carries a role string this service doesn't recognize.
    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        let claims = data.claims;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::unauthorized(format!("unknown role: {}", claims.role)))?;
        Ok(Principal {
            user_id: claims.sub,
            role,
            gym_id: claims.gym_id,
            branch_id: claims.branch_id,
            is_super_admin: claims.is_super_admin,
        })
    }
}

/// Hash a plaintext password with bcrypt at the library's recommended cost.
///
/// # Errors
/// Returns an error if bcrypt hashing fails (should only happen on an empty password
/// or the rare internal bcrypt error).
pub fn hash_password(plaintext: &str) -> AppResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// # Errors
/// Returns [`AppError::unauthorized`] on mismatch or malformed stored hash.
pub fn verify_password(plaintext: &str, hash: &str) -> AppResult<()> {
    let matches = bcrypt::verify(plaintext, hash)
        .map_err(|e| AppError::unauthorized(format!("invalid credentials: {e}")))?;
    if matches {
        Ok(())
    } else {
        Err(AppError::unauthorized("invalid credentials"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let service = TokenService::new("this-is-a-32-byte-minimum-secret!!");
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::GymOwner,
            gym_id: Some(Uuid::new_v4()),
            branch_id: None,
            is_super_admin: false,
        };
        let token = service.issue(&principal).expect("issue token");
        let recovered = service.verify(&token).expect("verify token");
        assert_eq!(recovered.user_id, principal.user_id);
        assert_eq!(recovered.gym_id, principal.gym_id);
        assert_eq!(recovered.role, Role::GymOwner);
    }

    #[test]
    fn rejects_tampered_signature() {
        let service = TokenService::new("this-is-a-32-byte-minimum-secret!!");
        let other = TokenService::new("a-totally-different-32-byte-secret!");
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Member,
            gym_id: Some(Uuid::new_v4()),
            branch_id: None,
            is_super_admin: false,
        };
        let token = service.issue(&principal).expect("issue token");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse battery staple").expect("hash");
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(verify_password("wrong password", &hash).is_err());
    }
}
