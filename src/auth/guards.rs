// ABOUTME: Role, feature-flag, and scope-extraction guards; each a pure function over a Principal
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::tenant::{Principal, Role};

/// Require that `principal.role` is in `allowed`. Super admins always pass.
///
/// # Errors
/// Returns [`AppError::forbidden`] if the principal's role is not in `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> AppResult<()> {
    if principal.is_super_admin || allowed.contains(&principal.role) {
        return Ok(());
    }
    Err(AppError::forbidden(format!(
        "role {:?} is not permitted; requires one of {allowed:?}",
        principal.role
    )))
}

/// Require that the gym `principal` belongs to has every feature in `required` enabled
/// on its subscription plan. Super admins always pass.
///
/// # Errors
/// Returns [`AppError::forbidden`] naming the missing feature if the plan lacks it, or
/// if the gym has no active subscription at all.
pub fn require_features(
    principal: &Principal,
    plan_features: Option<&[String]>,
    required: &[&str],
) -> AppResult<()> {
    if principal.is_super_admin {
        return Ok(());
    }
    let Some(features) = plan_features else {
        return Err(AppError::forbidden(
            "no active subscription for this gym; upgrade your plan to use this feature",
        ));
    };
    for feature in required {
        if !features.iter().any(|f| f == feature) {
            return Err(AppError::forbidden(format!(
                "feature '{feature}' is not included in your current plan; upgrade your plan to use this feature"
            )));
        }
    }
    Ok(())
}

/// Gym scope extracted for one request: required vs. optional, and whether the caller
/// is allowed to act on behalf of another user.
pub struct GymScope;

impl GymScope {
    /// Extract the required gym id for a gym-scoped operation.
    ///
    /// # Errors
    /// Returns [`AppError::forbidden`] if the principal is a super admin with no gym
    /// context (super admins must pick a gym explicitly for gym-scoped operations), or
    /// [`AppError::bad_request`] if a non-super-admin principal somehow lacks a gym id.
    pub fn required(principal: &Principal) -> AppResult<Uuid> {
        match principal.gym_id {
            Some(gym_id) => Ok(gym_id),
            None if principal.is_super_admin => Err(AppError::forbidden(
                "super admin must specify a gym for this gym-scoped operation",
            )),
            None => Err(AppError::bad_request("principal has no gym context")),
        }
    }

    /// Extract the gym id if present, without requiring it.
    #[must_use]
    pub const fn optional(principal: &Principal) -> Option<Uuid> {
        principal.gym_id
    }

    /// Extract the required branch id, honoring a header override only for roles
    /// permitted to act across branches (gym owners and super admins).
    ///
    /// # Errors
    /// Returns [`AppError::bad_request`] if no branch id is available from either the
    /// principal or an allowed override.
    pub fn required_branch(principal: &Principal, header_override: Option<Uuid>) -> AppResult<Uuid> {
        if let Some(branch_id) = header_override {
            let may_override = principal.is_super_admin || principal.role == Role::GymOwner;
            if may_override {
                return Ok(branch_id);
            }
        }
        principal
            .branch_id
            .ok_or_else(|| AppError::bad_request("no branch context for this operation"))
    }

    /// Resolve the effective target user id for "acting on behalf of" operations.
    /// Only gym owners, branch managers, and super admins may act on behalf of another
    /// user via the `x-user-id` header; everyone else is restricted to themselves.
    ///
    /// # Errors
    /// Returns [`AppError::forbidden`] if a role without delegation rights supplies a
    /// different user id than its own.
    pub fn effective_user_id(principal: &Principal, header_user_id: Option<Uuid>) -> AppResult<Uuid> {
        match header_user_id {
            None => Ok(principal.user_id),
            Some(target) if target == principal.user_id => Ok(target),
            Some(target) => {
                let may_delegate = principal.is_super_admin
                    || matches!(principal.role, Role::GymOwner | Role::BranchManager);
                if may_delegate {
                    Ok(target)
                } else {
                    Err(AppError::forbidden(
                        "role is not permitted to act on behalf of another user",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, gym_id: Option<Uuid>, is_super_admin: bool) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role,
            gym_id,
            branch_id: None,
            is_super_admin,
        }
    }

    #[test]
    fn role_guard_allows_listed_role() {
        let p = principal(Role::Staff, Some(Uuid::new_v4()), false);
        assert!(require_role(&p, &[Role::Staff, Role::BranchManager]).is_ok());
    }

    #[test]
    fn role_guard_rejects_unlisted_role() {
        let p = principal(Role::Member, Some(Uuid::new_v4()), false);
        assert!(require_role(&p, &[Role::Staff]).is_err());
    }

    #[test]
    fn role_guard_super_admin_bypasses() {
        let p = principal(Role::Member, None, true);
        assert!(require_role(&p, &[Role::Staff]).is_ok());
    }

    #[test]
    fn feature_guard_rejects_missing_feature() {
        let p = principal(Role::GymOwner, Some(Uuid::new_v4()), false);
        let features = vec!["attendance".to_owned()];
        let err = require_features(&p, Some(&features), &["gamification"]).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Forbidden);
    }

    #[test]
    fn feature_guard_rejects_missing_subscription() {
        let p = principal(Role::GymOwner, Some(Uuid::new_v4()), false);
        assert!(require_features(&p, None, &["gamification"]).is_err());
    }

    #[test]
    fn scenario_e4_matches_spec() {
        let p = principal(Role::GymOwner, Some(Uuid::new_v4()), false);
        let no_gamification = vec!["attendance".to_owned()];
        let err = require_features(&p, Some(&no_gamification), &["gamification"]).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Forbidden);

        let with_gamification = vec!["attendance".to_owned(), "gamification".to_owned()];
        assert!(require_features(&p, Some(&with_gamification), &["gamification"]).is_ok());
    }

    #[test]
    fn gym_scope_required_rejects_super_admin_without_gym() {
        let p = principal(Role::SuperAdmin, None, true);
        assert!(GymScope::required(&p).is_err());
    }

    #[test]
    fn delegation_requires_allowed_role() {
        let p = principal(Role::Member, Some(Uuid::new_v4()), false);
        let other = Uuid::new_v4();
        assert!(GymScope::effective_user_id(&p, Some(other)).is_err());
        assert!(GymScope::effective_user_id(&p, Some(p.user_id)).is_ok());
    }
}
