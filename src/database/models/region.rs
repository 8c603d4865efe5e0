use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Public projection of an administrative region. Regions populate no
/// references, so the projection is the row itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegion {
    pub name: String,
    pub code: String,
}

/// Field-level merge payload; a missing field leaves its column untouched.
#[derive(Debug, Default, Deserialize)]
pub struct RegionPatch {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl RegionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none()
    }
}
