use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Organizational branch. Owned by a collaborator service; this API only
/// reads branches for population and rewrites `region_ids` during the
/// region-deletion cascade.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub region_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Restricted branch projection exposed when a reference is populated.
#[derive(Debug, Clone, Serialize)]
pub struct BranchRef {
    pub id: Uuid,
    pub name: String,
}
