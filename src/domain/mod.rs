// ABOUTME: Representative tenant-facing HTTP handlers built on the kernel and pipelines
// ABOUTME: The remaining ~40 entity modules this platform exposes follow the same shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Achievement catalog and per-member earned achievements.
pub mod achievements;

/// Gym registration and login, the only routes reachable without a bearer token.
pub mod auth;

/// Attendance check-in and history.
pub mod attendance;

/// Branch CRUD.
pub mod branches;

/// Gamification challenges, gated behind a subscription feature.
pub mod challenges;

/// Membership lifecycle: enroll, pay, activate, cancel, list.
pub mod memberships;

/// Membership plan catalog.
pub mod plans;
