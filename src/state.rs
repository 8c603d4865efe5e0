use std::sync::Arc;

use sqlx::PgPool;

use crate::audit::{AuditEvent, AuditSink};
use crate::config::AppConfig;
use crate::permissions::PermissionChecker;

/// Shared application state, built once in `main` and handed to every
/// handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub permissions: Arc<PermissionChecker>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        permissions: PermissionChecker,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            permissions: Arc::new(permissions),
            audit,
        }
    }

    /// Record an audit event after a confirmed mutation. Best-effort: a
    /// failing sink is logged and never fails the request.
    pub async fn track(&self, event: AuditEvent) {
        if let Err(err) = self.audit.track(event.clone()).await {
            tracing::warn!(event = event.event, error = %err, "audit event dropped");
        }
    }
}
