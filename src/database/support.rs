// ABOUTME: Typed access to support tickets and messages, scoped by gym where applicable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppResult;

/// A support ticket row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SupportTicket {
    /// Ticket id.
    pub id: Uuid,
    /// Gym this ticket was raised from, if any.
    pub gym_id: Option<Uuid>,
    /// Subject line.
    pub subject: String,
    /// `open`, `pending`, or `closed`.
    pub status: String,
    /// When the ticket was opened.
    pub created_at: DateTime<Utc>,
}

/// Typed access to support tickets and their message threads.
#[derive(Clone)]
pub struct SupportRepository {
    pool: PgPool,
}

impl SupportRepository {
    /// Build a repository over the main pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a new ticket.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn open(&self, gym_id: Option<Uuid>, subject: &str) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO support_tickets (id, gym_id, subject) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(gym_id)
            .bind(subject)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Append a message to a ticket's thread.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn add_message(&self, ticket_id: Uuid, author_id: Option<Uuid>, body: &str) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO support_messages (id, ticket_id, author_id, body) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(ticket_id)
            .bind(author_id)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Close a ticket.
    ///
    /// # Errors
    /// Propagates database errors.
    pub async fn close(&self, ticket_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE support_tickets SET status = 'closed' WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
