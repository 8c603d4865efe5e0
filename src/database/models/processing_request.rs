use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::branch::BranchRef;
use super::monitoring_config::MonitoringConfigRef;
use super::patch_field;

/// Public projection of a processing request, with `branch` and `config`
/// populated to their restricted projections. `external_uid` is the
/// idempotency key assigned by the external geospatial API.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingRequest {
    pub id: Uuid,
    pub branch: Option<BranchRef>,
    pub config: Option<MonitoringConfigRef>,
    pub indicator: Option<String>,
    pub external_uid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row shape produced by the population JOIN.
#[derive(Debug, FromRow)]
pub struct ProcessingRequestRow {
    pub id: Uuid,
    pub indicator: Option<String>,
    pub external_uid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub config_id: Option<Uuid>,
    pub config_name: Option<String>,
    pub config_indicator: Option<String>,
}

impl ProcessingRequestRow {
    pub fn into_public(self) -> ProcessingRequest {
        let branch = match (self.branch_id, self.branch_name) {
            (Some(id), Some(name)) => Some(BranchRef { id, name }),
            _ => None,
        };
        let config = match (self.config_id, self.config_name) {
            (Some(id), Some(name)) => Some(MonitoringConfigRef {
                id,
                name,
                indicator: self.config_indicator,
            }),
            _ => None,
        };
        ProcessingRequest {
            id: self.id,
            branch,
            config,
            indicator: self.indicator,
            external_uid: self.external_uid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProcessingRequest {
    pub branch: Uuid,
    pub config: Uuid,
    pub indicator: Option<String>,
    pub external_uid: Option<String>,
}

/// Field-level merge payload. Missing fields stay untouched; nullable
/// fields accept an explicit `null` to unset the column.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessingRequestPatch {
    pub branch: Option<Uuid>,
    pub config: Option<Uuid>,
    #[serde(default, deserialize_with = "patch_field::deserialize")]
    pub indicator: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field::deserialize")]
    pub external_uid: Option<Option<String>>,
}

impl ProcessingRequestPatch {
    pub fn is_empty(&self) -> bool {
        self.branch.is_none()
            && self.config.is_none()
            && self.indicator.is_none()
            && self.external_uid.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_references_populate_as_null() {
        let row = ProcessingRequestRow {
            id: Uuid::new_v4(),
            indicator: Some("PRECIP".to_string()),
            external_uid: Some("job-42".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            branch_id: None,
            branch_name: None,
            config_id: None,
            config_name: None,
            config_indicator: None,
        };
        let public = row.into_public();
        assert!(public.branch.is_none());
        assert!(public.config.is_none());
        assert_eq!(public.external_uid.as_deref(), Some("job-42"));
    }
}
