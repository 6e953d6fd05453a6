// ABOUTME: Principal type and tenant-facing role enum shared by auth, kernel, and pipelines
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

mod broker;
mod registry;

pub use broker::TenantBroker;
pub use registry::TenantRegistry;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a principal holds, either platform-wide or within one gym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform super-administrator; bypasses all tenant-scope checks.
    SuperAdmin,
    /// Owns and administers one gym, across all its branches.
    GymOwner,
    /// Manages one or more branches of a gym.
    BranchManager,
    /// Front-desk/coaching staff, branch-scoped.
    Staff,
    /// A gym member, scoped to their own records only.
    Member,
}

impl Role {
    /// Parse from the lowercase snake_case form stored in JWT claims and the database.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "super_admin" => Some(Self::SuperAdmin),
            "gym_owner" => Some(Self::GymOwner),
            "branch_manager" => Some(Self::BranchManager),
            "staff" => Some(Self::Staff),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    /// The lowercase snake_case form stored in JWT claims and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::GymOwner => "gym_owner",
            Self::BranchManager => "branch_manager",
            Self::Staff => "staff",
            Self::Member => "member",
        }
    }
}

/// The authenticated identity attached to a request after the auth guard chain runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Platform user id (`public.users.id`).
    pub user_id: Uuid,
    /// Role held by this principal.
    pub role: Role,
    /// Gym this principal belongs to. `None` only for super admins.
    pub gym_id: Option<Uuid>,
    /// Branch this principal is scoped to, if role is branch- or staff-level.
    pub branch_id: Option<Uuid>,
    /// Shortcut for `role == Role::SuperAdmin`, checked first in every guard.
    pub is_super_admin: bool,
}

impl Principal {
    /// Whether this principal may act on data belonging to `gym_id`.
    #[must_use]
    pub fn can_access_gym(&self, gym_id: Uuid) -> bool {
        self.is_super_admin || self.gym_id == Some(gym_id)
    }

    /// Whether this principal may act on data scoped to `branch_id` within its own gym.
    #[must_use]
    pub fn can_access_branch(&self, branch_id: Uuid) -> bool {
        if self.is_super_admin || self.role == Role::GymOwner {
            return true;
        }
        self.branch_id == Some(branch_id)
    }
}
