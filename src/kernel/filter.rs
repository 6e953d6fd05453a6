// ABOUTME: Parameterized WHERE-clause builder shared by every list endpoint
// ABOUTME: Appends onto a sqlx QueryBuilder so the resulting SQL stays fully bound, never interpolated
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Comparison operator for one filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `column = value`
    Eq,
    /// `column != value`
    Ne,
    /// `column > value`
    Gt,
    /// `column >= value`
    Gte,
    /// `column < value`
    Lt,
    /// `column <= value`
    Lte,
    /// `column ILIKE '%value%'`
    Like,
}

impl FilterOp {
    const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "ILIKE",
        }
    }
}

/// A typed bound value usable in a filter clause. Covers the column types that appear
/// across the tenant schema; extend here rather than falling back to string interpolation.
#[derive(Debug, Clone)]
pub enum FilterValue {
    /// Text/varchar column.
    Text(String),
    /// Integer column.
    Int(i64),
    /// Numeric/decimal column, carried as its string representation and cast server-side.
    Numeric(String),
    /// Boolean column.
    Bool(bool),
    /// UUID column.
    Uuid(Uuid),
}

/// One `(column, operator, value)` filter triple.
#[derive(Debug, Clone)]
pub struct FilterClause {
    /// Column name. Caller-controlled but must come from a fixed allowlist per module,
    /// never from raw user text, since it is interpolated (values never are).
    pub column: &'static str,
    /// Comparison operator.
    pub op: FilterOp,
    /// Bound value.
    pub value: FilterValue,
}

/// Builds a parameterized `WHERE` clause from a list of filter triples plus an optional
/// branch scope, appending directly onto a [`QueryBuilder`] so every value stays bound.
pub struct FilterBuilder;

impl FilterBuilder {
    /// Append `WHERE <clauses> AND is_deleted = false [AND branch scope]` onto `builder`.
    /// If `clauses` is empty and no branch scope applies, appends only the soft-delete
    /// predicate. Always call this after the base `SELECT ... FROM table` fragment.
    pub fn apply<'a>(
        builder: &mut QueryBuilder<'a, Postgres>,
        clauses: &'a [FilterClause],
        branch_scope: Option<Uuid>,
        include_deleted: bool,
    ) {
        builder.push(" WHERE 1=1");
        if !include_deleted {
            builder.push(" AND is_deleted = false");
        }
        for clause in clauses {
            builder.push(" AND ").push(clause.column).push(' ');
            if clause.op == FilterOp::Like {
                builder.push("ILIKE ");
                match &clause.value {
                    FilterValue::Text(v) => {
                        builder.push_bind(format!("%{v}%"));
                    }
                    other => {
                        builder.push_bind(format!("{other:?}"));
                    }
                }
                continue;
            }
            builder.push(clause.op.sql()).push(' ');
            match &clause.value {
                FilterValue::Text(v) => {
                    builder.push_bind(v.clone());
                }
                FilterValue::Int(v) => {
                    builder.push_bind(*v);
                }
                FilterValue::Numeric(v) => {
                    builder.push_bind(v.clone());
                }
                FilterValue::Bool(v) => {
                    builder.push_bind(*v);
                }
                FilterValue::Uuid(v) => {
                    builder.push_bind(*v);
                }
            }
        }
        if let Some(branch_id) = branch_scope {
            builder
                .push(" AND (branch_id = ")
                .push_bind(branch_id)
                .push(" OR branch_id IS NULL)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_op_renders_expected_sql() {
        assert_eq!(FilterOp::Eq.sql(), "=");
        assert_eq!(FilterOp::Like.sql(), "ILIKE");
    }

    #[test]
    fn apply_with_no_clauses_still_filters_soft_delete() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users");
        FilterBuilder::apply(&mut builder, &[], None, false);
        assert!(builder.sql().contains("is_deleted = false"));
    }

    #[test]
    fn apply_includes_branch_scope() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users");
        let branch = Uuid::new_v4();
        FilterBuilder::apply(&mut builder, &[], Some(branch), false);
        assert!(builder.sql().contains("branch_id IS NULL"));
    }
}
