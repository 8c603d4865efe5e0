// Access layer for monitoring configuration data.
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dal::{total_pages, PageOptions, Paginated};
use crate::database::manager::DatabaseError;
use crate::database::models::monitoring_config::{
    MonitoringConfig, MonitoringConfigPatch, MonitoringConfigRow, NewMonitoringConfig,
};
use crate::filter::{ColumnSpec, SearchFilter};

/// Searchable columns exposed on the config search endpoint.
pub const SEARCH_FIELDS: &[ColumnSpec] = &[
    ColumnSpec::id("user", "user_id"),
    ColumnSpec::id("branch", "branch_id"),
    ColumnSpec::text("name", "name"),
    ColumnSpec::text("indicator", "indicator"),
];

/// Columns accepted for `sort_by` on the paginated listing.
pub const SORT_FIELDS: &[&str] = &["created_at", "updated_at", "name", "indicator"];

/// SQL column the listing scope restricts on.
pub const BRANCH_COLUMN: &str = "branch_id";

// Population pipeline: user and branch references resolve to their
// restricted projections, NULL when dangling.
const POPULATED_SELECT: &str = "SELECT c.id, c.name, c.indicator, c.period_start, c.period_end, \
     c.created_at, c.updated_at, \
     u.id AS user_id, u.username AS user_username, u.email AS user_email, \
     b.id AS branch_id, b.name AS branch_name \
     FROM monitoring_configs c \
     LEFT JOIN users u ON u.id = c.user_id \
     LEFT JOIN branches b ON b.id = c.branch_id";

/// Create a config and return it through the same projection/population
/// pipeline as `get`.
pub async fn create(
    pool: &PgPool,
    data: &NewMonitoringConfig,
) -> Result<MonitoringConfig, DatabaseError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO monitoring_configs \
         (id, user_id, name, branch_id, indicator, period_start, period_end, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())",
    )
    .bind(id)
    .bind(data.user)
    .bind(&data.name)
    .bind(data.branch)
    .bind(&data.indicator)
    .bind(data.period_start)
    .bind(data.period_end)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::QueryError("config missing after insert".to_string()))
}

/// Fetch one config by id, populated; absence is not an error.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<MonitoringConfig>, DatabaseError> {
    let row = sqlx::query_as::<_, MonitoringConfigRow>(&format!(
        "{POPULATED_SELECT} WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(MonitoringConfigRow::into_public))
}

/// Fetch the config owned by a user, if any. The at-most-one-per-user rule
/// is checked through this lookup at creation time, not enforced by a
/// constraint, so two racing creates can both pass the check.
pub async fn get_by_user(
    pool: &PgPool,
    user: Uuid,
) -> Result<Option<MonitoringConfig>, DatabaseError> {
    let row = sqlx::query_as::<_, MonitoringConfigRow>(&format!(
        "{POPULATED_SELECT} WHERE c.user_id = $1 LIMIT 1"
    ))
    .bind(user)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(MonitoringConfigRow::into_public))
}

/// Field-level merge; always refreshes `updated_at`. Returns the
/// post-update populated record, or `None` when no row matched.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &MonitoringConfigPatch,
) -> Result<Option<MonitoringConfig>, DatabaseError> {
    let mut qb = QueryBuilder::new("UPDATE monitoring_configs SET updated_at = now()");
    if let Some(user) = patch.user {
        qb.push(", user_id = ");
        qb.push_bind(user);
    }
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.clone());
    }
    if let Some(branch) = patch.branch {
        qb.push(", branch_id = ");
        qb.push_bind(branch);
    }
    if let Some(indicator) = &patch.indicator {
        qb.push(", indicator = ");
        qb.push_bind(indicator.clone());
    }
    if let Some(period_start) = patch.period_start {
        qb.push(", period_start = ");
        qb.push_bind(period_start);
    }
    if let Some(period_end) = patch.period_end {
        qb.push(", period_end = ");
        qb.push_bind(period_end);
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
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<MonitoringConfig>, DatabaseError> {
    let Some(config) = get(pool, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM monitoring_configs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(Some(config))
}

/// All configs matching the filter, populated, in natural storage order.
pub async fn get_collection(
    pool: &PgPool,
    filter: &SearchFilter,
) -> Result<Vec<MonitoringConfig>, DatabaseError> {
    let mut qb = QueryBuilder::new(POPULATED_SELECT);
    filter.apply(&mut qb, Some("c"));
    let rows = qb
        .build_query_as::<MonitoringConfigRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(MonitoringConfigRow::into_public).collect())
}

/// Paginated listing; see `Paginated` for the envelope contract.
pub async fn get_collection_by_pagination(
    pool: &PgPool,
    filter: &SearchFilter,
    opts: &PageOptions,
) -> Result<Paginated<MonitoringConfig>, DatabaseError> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM monitoring_configs c");
    filter.apply(&mut count_qb, Some("c"));
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(POPULATED_SELECT);
    filter.apply(&mut qb, Some("c"));
    qb.push(" ORDER BY c.");
    qb.push(opts.sort);
    qb.push(" DESC LIMIT ");
    qb.push_bind(opts.limit);
    qb.push(" OFFSET ");
    qb.push_bind(opts.offset());
    let rows = qb
        .build_query_as::<MonitoringConfigRow>()
        .fetch_all(pool)
        .await?;

    Ok(Paginated {
        total_pages: total_pages(total, opts.limit),
        total_docs_count: total,
        current_page: opts.page,
        docs: rows.into_iter().map(MonitoringConfigRow::into_public).collect(),
    })
}
