// Access layer for region data.
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dal::{total_pages, PageOptions, Paginated};
use crate::database::manager::DatabaseError;
use crate::database::models::region::{NewRegion, Region, RegionPatch};
use crate::filter::{ColumnSpec, SearchFilter};

/// Searchable columns exposed on the region search endpoint.
pub const SEARCH_FIELDS: &[ColumnSpec] = &[
    ColumnSpec::text("name", "name"),
    ColumnSpec::text("code", "code"),
];

/// Columns accepted for `sort_by` on the paginated listing.
pub const SORT_FIELDS: &[&str] = &["created_at", "updated_at", "name", "code"];

/// Create a region and return it through the same projection as `get`.
/// Both timestamps are set in the same statement, so they are equal on a
/// freshly created record.
pub async fn create(pool: &PgPool, data: &NewRegion) -> Result<Region, DatabaseError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO regions (id, name, code, created_at, updated_at)
         VALUES ($1, $2, $3, now(), now())",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.code)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::QueryError("region missing after insert".to_string()))
}

/// Fetch one region by id; absence is not an error.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Region>, DatabaseError> {
    let region = sqlx::query_as::<_, Region>(
        "SELECT id, name, code, created_at, updated_at FROM regions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(region)
}

/// Duplicate probe used by the create handler: a region already holding
/// either unique field.
pub async fn get_by_name_or_code(
    pool: &PgPool,
    name: &str,
    code: &str,
) -> Result<Option<Region>, DatabaseError> {
    let region = sqlx::query_as::<_, Region>(
        "SELECT id, name, code, created_at, updated_at FROM regions
         WHERE name = $1 OR code = $2 LIMIT 1",
    )
    .bind(name)
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(region)
}

/// Field-level merge; always refreshes `updated_at`. Returns the
/// post-update record, or `None` when no row matched.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &RegionPatch,
) -> Result<Option<Region>, DatabaseError> {
    let mut qb = QueryBuilder::new("UPDATE regions SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.clone());
    }
    if let Some(code) = &patch.code {
        qb.push(", code = ");
        qb.push_bind(code.clone());
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get(pool, id).await
}

/// Delete by id, returning the pre-deletion record; `None` when absent.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Region>, DatabaseError> {
    let Some(region) = get(pool, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM regions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(Some(region))
}

/// All regions matching the filter, in natural storage order.
pub async fn get_collection(
    pool: &PgPool,
    filter: &SearchFilter,
) -> Result<Vec<Region>, DatabaseError> {
    let mut qb = QueryBuilder::new("SELECT id, name, code, created_at, updated_at FROM regions");
    filter.apply(&mut qb, None);
    let regions = qb.build_query_as::<Region>().fetch_all(pool).await?;
    Ok(regions)
}

/// Paginated listing; see `Paginated` for the envelope contract.
pub async fn get_collection_by_pagination(
    pool: &PgPool,
    filter: &SearchFilter,
    opts: &PageOptions,
) -> Result<Paginated<Region>, DatabaseError> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM regions");
    filter.apply(&mut count_qb, None);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new("SELECT id, name, code, created_at, updated_at FROM regions");
    filter.apply(&mut qb, None);
    qb.push(" ORDER BY ");
    qb.push(opts.sort);
    qb.push(" DESC LIMIT ");
    qb.push_bind(opts.limit);
    qb.push(" OFFSET ");
    qb.push_bind(opts.offset());
    let docs = qb.build_query_as::<Region>().fetch_all(pool).await?;

    Ok(Paginated {
        total_pages: total_pages(total, opts.limit),
        total_docs_count: total,
        current_page: opts.page,
        docs,
    })
}
