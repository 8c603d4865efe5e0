// Access layer for principal accounts, read-only. Supplies the
// branch-scoping inputs for listing endpoints.
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::account::Account;

/// The account attached to a user, if one is provisioned.
pub async fn get_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Account>, DatabaseError> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT id, user_id, default_branch, access_branches, multi_branches \
         FROM accounts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}
