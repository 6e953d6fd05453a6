// ABOUTME: Axum router assembly: public auth routes, then the authenticated `/api` tree
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::context::AppState;
use crate::domain::{achievements, attendance, auth, branches, challenges, memberships, plans};
use crate::middleware::{self, authenticate};

/// Build the full application router: public auth endpoints unguarded, everything else
/// behind the [`authenticate`] middleware which materializes the request's
/// [`crate::context::RequestContext`].
#[must_use]
pub fn build(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register-gym", post(auth::register_gym))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/branches", get(branches::list).post(branches::create))
        .route("/branches/:id", patch(branches::rename).delete(branches::delete))
        .route("/plans", get(plans::list).post(plans::create))
        .route("/plans/:id", axum::routing::delete(plans::retire))
        .route("/memberships", get(memberships::list).post(memberships::create))
        .route("/memberships/:id/pay", post(memberships::pay))
        .route("/memberships/:id/cancel", post(memberships::cancel))
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance", get(attendance::list))
        .route("/challenges", get(challenges::list).post(challenges::create))
        .route("/achievements", get(achievements::catalog))
        .route("/achievements/mine", get(achievements::mine))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest(
            "/api",
            Router::new().merge(public).merge(protected),
        )
        .layer(middleware::cors::layer(&state.config.network))
        .layer(middleware::tracing::layer())
        .with_state(state)
}
