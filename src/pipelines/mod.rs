// ABOUTME: Multi-row write pipelines reacting to attendance, membership, and loyalty events
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

pub mod attendance;
pub mod engagement;
pub mod loyalty;
pub mod membership;

use crate::notifications::NotificationHub;

/// Shared collaborator bundle every pipeline function takes: the notification hub for
/// semantic helpers, cloned cheaply per call site.
#[derive(Clone)]
pub struct PipelineContext {
    /// Notification storage and best-effort real-time fan-out.
    pub notifications: NotificationHub,
}
