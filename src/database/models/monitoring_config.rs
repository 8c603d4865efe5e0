use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::branch::BranchRef;
use super::patch_field;
use super::user::UserRef;

/// Public projection of a monitoring configuration, with the `user` and
/// `branch` references populated to their restricted projections. A
/// dangling reference populates as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringConfig {
    pub id: Uuid,
    pub user: Option<UserRef>,
    pub name: String,
    pub branch: Option<BranchRef>,
    pub indicator: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Restricted projection exposed when another entity populates a config
/// reference.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringConfigRef {
    pub id: Uuid,
    pub name: String,
    pub indicator: Option<String>,
}

/// Flat row shape produced by the population JOIN.
#[derive(Debug, FromRow)]
pub struct MonitoringConfigRow {
    pub id: Uuid,
    pub name: String,
    pub indicator: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub user_username: Option<String>,
    pub user_email: Option<String>,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
}

impl MonitoringConfigRow {
    pub fn into_public(self) -> MonitoringConfig {
        let user = match (self.user_id, self.user_username) {
            (Some(id), Some(username)) => Some(UserRef {
                id,
                username,
                email: self.user_email,
            }),
            _ => None,
        };
        let branch = match (self.branch_id, self.branch_name) {
            (Some(id), Some(name)) => Some(BranchRef { id, name }),
            _ => None,
        };
        MonitoringConfig {
            id: self.id,
            user,
            name: self.name,
            branch,
            indicator: self.indicator,
            period_start: self.period_start,
            period_end: self.period_end,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMonitoringConfig {
    pub user: Uuid,
    pub name: String,
    pub branch: Uuid,
    pub indicator: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

/// Field-level merge payload. Missing fields stay untouched; nullable
/// fields accept an explicit `null` to unset the column.
#[derive(Debug, Default, Deserialize)]
pub struct MonitoringConfigPatch {
    pub user: Option<Uuid>,
    pub name: Option<String>,
    pub branch: Option<Uuid>,
    #[serde(default, deserialize_with = "patch_field::deserialize")]
    pub indicator: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field::deserialize")]
    pub period_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "patch_field::deserialize")]
    pub period_end: Option<Option<DateTime<Utc>>>,
}

impl MonitoringConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.name.is_none()
            && self.branch.is_none()
            && self.indicator.is_none()
            && self.period_start.is_none()
            && self.period_end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let patch: MonitoringConfigPatch =
            serde_json::from_value(serde_json::json!({ "name": "drought watch" })).unwrap();
        assert_eq!(patch.name.as_deref(), Some("drought watch"));
        assert!(patch.indicator.is_none(), "absent field must stay untouched");

        let patch: MonitoringConfigPatch =
            serde_json::from_value(serde_json::json!({ "indicator": null })).unwrap();
        assert_eq!(patch.indicator, Some(None), "explicit null must unset");

        let patch: MonitoringConfigPatch =
            serde_json::from_value(serde_json::json!({ "indicator": "VI" })).unwrap();
        assert_eq!(patch.indicator, Some(Some("VI".to_string())));
    }

    #[test]
    fn empty_patch_is_detected() {
        let patch: MonitoringConfigPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(patch.is_empty());
    }
}
