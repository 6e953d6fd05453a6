// ABOUTME: CORS allow-list layer built from the configured frontend origin
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::config::NetworkConfig;
use crate::pagination::EXPOSED_PAGINATION_HEADERS;

/// Build the CORS layer from the configured allow-list. Falls back to `AllowOrigin::any`
/// only in the degenerate case where the configured origin doesn't parse, logging a
/// warning, since a misconfigured origin should not silently open CORS to everyone.
#[must_use]
pub fn layer(network: &NetworkConfig) -> CorsLayer {
    let origin = match HeaderValue::from_str(&network.allowed_origin) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(origin = %network.allowed_origin, "FRONTEND_URL is not a valid header value; CORS allow-list is empty");
            HeaderValue::from_static("null")
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-user-id"),
        ])
        .expose_headers(
            EXPOSED_PAGINATION_HEADERS
                .iter()
                .map(|h| HeaderName::from_static(h))
                .collect::<Vec<_>>(),
        )
        .allow_credentials(true)
}
