// Access layer for processing request data.
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dal::{total_pages, PageOptions, Paginated};
use crate::database::manager::DatabaseError;
use crate::database::models::processing_request::{
    NewProcessingRequest, ProcessingRequest, ProcessingRequestPatch, ProcessingRequestRow,
};
use crate::filter::{ColumnSpec, SearchFilter};

/// Searchable columns exposed on the request search endpoint.
pub const SEARCH_FIELDS: &[ColumnSpec] = &[
    ColumnSpec::id("branch", "branch_id"),
    ColumnSpec::id("config", "config_id"),
    ColumnSpec::text("indicator", "indicator"),
    ColumnSpec::text("external_uid", "external_uid"),
];

/// Columns accepted for `sort_by` on the paginated listing.
pub const SORT_FIELDS: &[&str] = &["created_at", "updated_at", "indicator", "external_uid"];

/// SQL column the listing scope restricts on.
pub const BRANCH_COLUMN: &str = "branch_id";

// Population pipeline: branch and config references resolve to their
// restricted projections, NULL when dangling.
const POPULATED_SELECT: &str = "SELECT r.id, r.indicator, r.external_uid, r.created_at, r.updated_at, \
     b.id AS branch_id, b.name AS branch_name, \
     g.id AS config_id, g.name AS config_name, g.indicator AS config_indicator \
     FROM processing_requests r \
     LEFT JOIN branches b ON b.id = r.branch_id \
     LEFT JOIN monitoring_configs g ON g.id = r.config_id";

/// Create a request and return it through the same projection/population
/// pipeline as `get`.
pub async fn create(
    pool: &PgPool,
    data: &NewProcessingRequest,
) -> Result<ProcessingRequest, DatabaseError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO processing_requests \
         (id, branch_id, config_id, indicator, external_uid, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, now(), now())",
    )
    .bind(id)
    .bind(data.branch)
    .bind(data.config)
    .bind(&data.indicator)
    .bind(&data.external_uid)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::QueryError("request missing after insert".to_string()))
}

/// Fetch one request by id, populated; absence is not an error.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<ProcessingRequest>, DatabaseError> {
    let row = sqlx::query_as::<_, ProcessingRequestRow>(&format!(
        "{POPULATED_SELECT} WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(ProcessingRequestRow::into_public))
}

/// Idempotency lookup: the request carrying this external identifier, if
/// one exists. `external_uid` is the single canonical field for storage,
/// lookup and update.
pub async fn get_by_external_uid(
    pool: &PgPool,
    external_uid: &str,
) -> Result<Option<ProcessingRequest>, DatabaseError> {
    let row = sqlx::query_as::<_, ProcessingRequestRow>(&format!(
        "{POPULATED_SELECT} WHERE r.external_uid = $1 LIMIT 1"
    ))
    .bind(external_uid)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(ProcessingRequestRow::into_public))
}

/// Field-level merge; always refreshes `updated_at`. Returns the
/// post-update populated record, or `None` when no row matched.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &ProcessingRequestPatch,
) -> Result<Option<ProcessingRequest>, DatabaseError> {
    let mut qb = QueryBuilder::new("UPDATE processing_requests SET updated_at = now()");
    if let Some(branch) = patch.branch {
        qb.push(", branch_id = ");
        qb.push_bind(branch);
    }
    if let Some(config) = patch.config {
        qb.push(", config_id = ");
        qb.push_bind(config);
    }
    if let Some(indicator) = &patch.indicator {
        qb.push(", indicator = ");
        qb.push_bind(indicator.clone());
    }
    if let Some(external_uid) = &patch.external_uid {
        qb.push(", external_uid = ");
        qb.push_bind(external_uid.clone());
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get(pool, id).await
}

/// Delete by id, returning the pre-deletion populated record; `None` when
/// absent.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<ProcessingRequest>, DatabaseError> {
    let Some(request) = get(pool, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM processing_requests WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(Some(request))
}

/// All requests matching the filter, populated, in natural storage order.
pub async fn get_collection(
    pool: &PgPool,
    filter: &SearchFilter,
) -> Result<Vec<ProcessingRequest>, DatabaseError> {
    let mut qb = QueryBuilder::new(POPULATED_SELECT);
    filter.apply(&mut qb, Some("r"));
    let rows = qb
        .build_query_as::<ProcessingRequestRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(ProcessingRequestRow::into_public).collect())
}

/// Paginated listing; see `Paginated` for the envelope contract.
pub async fn get_collection_by_pagination(
    pool: &PgPool,
    filter: &SearchFilter,
    opts: &PageOptions,
) -> Result<Paginated<ProcessingRequest>, DatabaseError> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM processing_requests r");
    filter.apply(&mut count_qb, Some("r"));
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(POPULATED_SELECT);
    filter.apply(&mut qb, Some("r"));
    qb.push(" ORDER BY r.");
    qb.push(opts.sort);
    qb.push(" DESC LIMIT ");
    qb.push_bind(opts.limit);
    qb.push(" OFFSET ");
    qb.push_bind(opts.offset());
    let rows = qb
        .build_query_as::<ProcessingRequestRow>()
        .fetch_all(pool)
        .await?;

    Ok(Paginated {
        total_pages: total_pages(total, opts.limit),
        total_docs_count: total,
        current_page: opts.page,
        docs: rows.into_iter().map(ProcessingRequestRow::into_public).collect(),
    })
}
