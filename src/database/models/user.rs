use serde::Serialize;
use uuid::Uuid;

/// Restricted user projection exposed when a reference is populated.
#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}
