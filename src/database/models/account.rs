use sqlx::FromRow;
use uuid::Uuid;

/// Principal account used for branch-scoping decisions on listing
/// endpoints. Read-only here; provisioning belongs to a collaborator.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub default_branch: Option<Uuid>,
    pub access_branches: Vec<Uuid>,
    pub multi_branches: bool,
}
