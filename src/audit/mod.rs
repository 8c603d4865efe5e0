// Audit event sink. One event per confirmed mutation (plus view events on
// single-record fetches), written after the database operation succeeds.
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One recorded event: what happened, who did it, a human-readable
/// message, and for updates the submitted diff.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event: &'static str,
    pub actor: Uuid,
    pub message: String,
    pub diff: Option<Value>,
}

impl AuditEvent {
    pub fn new(event: &'static str, actor: Uuid, message: impl Into<String>) -> Self {
        Self {
            event,
            actor,
            message: message.into(),
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: Value) -> Self {
        self.diff = Some(diff);
        self
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn track(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Default sink: appends events to the `audit_events` table.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn track(&self, event: AuditEvent) -> Result<(), AuditError> {
        sqlx::query(
            "INSERT INTO audit_events (id, event, actor_id, message, diff) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(event.event)
        .bind(event.actor)
        .bind(&event.message)
        .bind(event.diff)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
