// ABOUTME: Offset-based pagination shared by every list endpoint in the domain kernel
// ABOUTME: Clamps page/limit, emits the X-Total-* response headers, supports noPagination
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Maximum page size a caller may request.
pub const MAX_LIMIT: i64 = 100;
/// Page size used when the caller does not specify one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Raw pagination query parameters as they arrive over HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to `[1, MAX_LIMIT]`.
    pub limit: Option<i64>,
    /// When true, pagination is bypassed entirely and all rows are returned.
    #[serde(default)]
    pub no_pagination: bool,
}

/// Clamped, ready-to-use pagination parameters.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// 1-based page number, always `>= 1`.
    pub page: i64,
    /// Page size, always in `[1, MAX_LIMIT]`.
    pub limit: i64,
    /// Bypass LIMIT/OFFSET and return every row.
    pub no_pagination: bool,
}

impl Pagination {
    /// Clamp raw query parameters into valid pagination settings.
    #[must_use]
    pub fn from_query(query: &PaginationQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self {
            page,
            limit,
            no_pagination: query.no_pagination,
        }
    }

    /// `OFFSET` value for the `LIMIT/OFFSET` data query.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata returned alongside a page of data.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Current page.
    pub page: i64,
    /// Page size used.
    pub limit: i64,
    /// Total matching rows, ignoring LIMIT/OFFSET.
    pub total: i64,
    /// `ceil(total / limit)`, minimum 1.
    pub total_pages: i64,
}

impl PaginationMeta {
    /// Build the metadata block from the clamped pagination and a `COUNT(*)` result.
    #[must_use]
    pub fn new(pagination: &Pagination, total: i64) -> Self {
        let total_pages = if pagination.no_pagination {
            1
        } else {
            (total + pagination.limit - 1) / pagination.limit.max(1)
        }
        .max(1);
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages,
        }
    }
}

/// One page of typed rows plus its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// The rows for this page.
    pub data: Vec<T>,
    /// Pagination metadata, mirrored in the response headers.
    pub pagination: PaginationMeta,
}

impl<T: Serialize> Page<T> {
    /// Wrap rows and metadata into one envelope.
    #[must_use]
    pub const fn new(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self { data, pagination }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let mut response = axum::Json(&self).into_response();
        let headers = response.headers_mut();
        let meta = &self.pagination;
        insert_int_header(headers, "x-total-count", meta.total);
        insert_int_header(headers, "x-page", meta.page);
        insert_int_header(headers, "x-per-page", meta.limit);
        insert_int_header(headers, "x-total-pages", meta.total_pages);
        response
    }
}

fn insert_int_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: i64) {
    if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, v);
    }
}

/// Header names exposed to browsers via `Access-Control-Expose-Headers`.
pub const EXPOSED_PAGINATION_HEADERS: [&str; 4] =
    ["x-total-count", "x-page", "x-per-page", "x-total-pages"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit_to_range() {
        let p = Pagination::from_query(&PaginationQuery {
            page: Some(0),
            limit: Some(500),
            no_pagination: false,
        });
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_LIMIT);
    }

    #[test]
    fn offset_matches_page_and_limit() {
        let p = Pagination::from_query(&PaginationQuery {
            page: Some(3),
            limit: Some(10),
            no_pagination: false,
        });
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::from_query(&PaginationQuery {
            page: Some(1),
            limit: Some(10),
            no_pagination: false,
        });
        let meta = PaginationMeta::new(&p, 25);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn no_pagination_reports_single_page() {
        let p = Pagination::from_query(&PaginationQuery {
            page: Some(1),
            limit: Some(10),
            no_pagination: true,
        });
        let meta = PaginationMeta::new(&p, 973);
        assert_eq!(meta.total_pages, 1);
    }
}
