// Access layer for branch data. Branches belong to a collaborator service;
// this API only reads them for population and rewrites their embedded
// region list during the region-deletion cascade.
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::branch::Branch;

/// Load every branch. The deletion cascade scans the whole collection, an
/// acceptable full scan while the branch set stays small.
pub async fn get_collection(pool: &PgPool) -> Result<Vec<Branch>, DatabaseError> {
    let branches = sqlx::query_as::<_, Branch>(
        "SELECT id, name, region_ids, created_at, updated_at FROM branches",
    )
    .fetch_all(pool)
    .await?;
    Ok(branches)
}

/// Replace a branch's embedded region list in a single atomic update.
pub async fn set_regions(
    pool: &PgPool,
    id: Uuid,
    region_ids: Vec<Uuid>,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE branches SET region_ids = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(region_ids)
        .execute(pool)
        .await?;
    Ok(())
}
