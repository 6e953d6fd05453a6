// ABOUTME: Axum middleware that authenticates a request and materializes its RequestContext
// ABOUTME: Acquires a tenant connection up front when the principal has a gym, releases it on exit
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::context::{AppState, RequestContext};
use crate::errors::AppError;
use crate::tenant::TenantRegistry;

/// Authenticate the bearer token, acquire a tenant connection if the principal has a
/// gym, and attach the resulting [`RequestContext`] as a request extension. Releases
/// the tenant connection (restoring `search_path`) once the handler has produced its
/// response, regardless of success or failure.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };
    let principal = match state.tokens.verify(token) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let tenant_conn = if let Some(gym_id) = principal.gym_id {
        let schema = TenantRegistry::schema_name(gym_id);
        match state.broker.tenant_pool().acquire().await {
            Ok(mut conn) => {
                if let Err(err) = sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
                    .execute(&mut *conn)
                    .await
                {
                    return AppError::from(err).into_response();
                }
                Some(Mutex::new(conn))
            }
            Err(err) => return AppError::from(err).into_response(),
        }
    } else {
        None
    };

    let context = Arc::new(RequestContext::new(principal, state.main_pool.clone(), tenant_conn));
    request.extensions_mut().insert(Arc::clone(&context));

    let response = next.run(request).await;

    match Arc::try_unwrap(context) {
        Ok(context) => context.release().await,
        Err(_) => tracing::warn!("request context outlived its request; tenant connection not explicitly released"),
    }

    response
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Authorization header must be a Bearer token"))
}
