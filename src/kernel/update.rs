// ABOUTME: Generic dynamic-UPDATE builder: only caller-supplied columns land in SET
// ABOUTME: Replaces the per-entity "if field.is_some()" ladder the source used
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::filter::FilterValue;

/// One optional column assignment: only included in the `UPDATE` if `value` is `Some`.
pub struct Assignment {
    /// Target column name.
    pub column: &'static str,
    /// New value, or `None` to leave the column untouched.
    pub value: Option<FilterValue>,
}

/// Builds `UPDATE table SET col = val, ..., updated_at = now() WHERE id = $id` from a
/// list of optional assignments, short-circuiting to a no-op when none are present.
pub struct UpdateBuilder;

impl UpdateBuilder {
    /// Build the query, or return `None` if every assignment was absent (a pure no-op
    /// update that callers should treat as "nothing changed, re-read and return").
    #[must_use]
    pub fn build<'a>(
        table: &'a str,
        assignments: &'a [Assignment],
        id: Uuid,
        touch_updated_at: bool,
    ) -> Option<QueryBuilder<'a, Postgres>> {
        let present: Vec<&Assignment> = assignments.iter().filter(|a| a.value.is_some()).collect();
        if present.is_empty() && !touch_updated_at {
            return None;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
        builder.push(table).push(" SET ");

        let mut first = true;
        for assignment in &present {
            if !first {
                builder.push(", ");
            }
            first = false;
            builder.push(assignment.column).push(" = ");
            let Some(value) = assignment.value.clone() else {
                continue;
            };
            match value {
                FilterValue::Text(v) => builder.push_bind(v),
                FilterValue::Int(v) => builder.push_bind(v),
                FilterValue::Numeric(v) => builder.push_bind(v),
                FilterValue::Bool(v) => builder.push_bind(v),
                FilterValue::Uuid(v) => builder.push_bind(v),
            };
        }
        if touch_updated_at {
            if !first {
                builder.push(", ");
            }
            builder.push("updated_at = now()");
        }
        builder.push(" WHERE id = ").push_bind(id);
        Some(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_assignments_and_no_touch_is_none() {
        let result = UpdateBuilder::build("users", &[], Uuid::new_v4(), false);
        assert!(result.is_none());
    }

    #[test]
    fn only_present_assignments_are_included() {
        let assignments = vec![
            Assignment {
                column: "name",
                value: Some(FilterValue::Text("Ada".to_owned())),
            },
            Assignment {
                column: "email",
                value: None,
            },
        ];
        let builder = UpdateBuilder::build("users", &assignments, Uuid::new_v4(), true);
        let builder = builder.expect("should build");
        assert!(builder.sql().contains("name = "));
        assert!(!builder.sql().contains("email = "));
        assert!(builder.sql().contains("updated_at = now()"));
    }
}
